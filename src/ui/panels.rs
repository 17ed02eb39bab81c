use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::analysis::aggregate::{SpatialTotals, Summary};
use crate::data::filter::{StateSelection, ALL_STATES};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (Some(snapshot), Some(selection)) = (state.snapshot.clone(), state.selection.clone())
    else {
        ui.label("No dataset loaded.");
        return;
    };

    // ---- State selector ----
    ui.strong("Select State");
    let mut chosen = selection.state.clone();
    egui::ComboBox::from_id_salt("state_select")
        .selected_text(chosen.to_string())
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            ui.selectable_value(&mut chosen, StateSelection::All, ALL_STATES);
            for name in &snapshot.states {
                ui.selectable_value(&mut chosen, StateSelection::Named(name.clone()), name);
            }
        });
    state.select_state(chosen);

    ui.add_space(8.0);

    // ---- Year range ----
    let Some((min_year, max_year)) = snapshot.year_bounds else {
        return;
    };
    ui.strong("Select Year Range");
    let mut lo = selection.years.lo();
    let mut hi = selection.years.hi();
    let lo_changed = ui
        .add(egui::Slider::new(&mut lo, min_year..=max_year).text("From"))
        .changed();
    let hi_changed = ui
        .add(egui::Slider::new(&mut hi, min_year..=max_year).text("To"))
        .changed();

    // Dragging one end past the other pushes the other end along.
    if lo_changed && lo > hi {
        hi = lo;
    }
    if hi_changed && hi < lo {
        lo = hi;
    }
    state.select_years(lo, hi);

    ui.add_space(8.0);
    ui.separator();
    if let Some(view) = &state.view {
        ui.label(format!("{} records selected", view.record_count));
        ui.label(format!("{} months in series", view.monthly.len()));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the title bar with dataset info and any status message.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("Road Accident Pattern Analysis");

        if let Some(snapshot) = &state.snapshot {
            ui.separator();
            let years = match snapshot.year_bounds {
                Some((lo, hi)) => format!("{lo}–{hi}"),
                None => "no years".to_string(),
            };
            ui.label(format!(
                "{} records, {} states, {years}",
                snapshot.len(),
                snapshot.states.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

/// Three metric tiles side by side.
pub fn metrics_row(ui: &mut Ui, summary: &Summary) {
    ui.columns(3, |cols| {
        metric(&mut cols[0], "Total Accidents", summary.accidents);
        metric(&mut cols[1], "Total Injuries", summary.injuries);
        metric(&mut cols[2], "Total Deaths", summary.deaths);
    });
}

fn metric(ui: &mut Ui, label: &str, value: u64) {
    ui.label(RichText::new(label).weak());
    ui.label(RichText::new(group_thousands(value)).size(28.0).strong());
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Per-state totals table
// ---------------------------------------------------------------------------

/// State totals, largest first.
pub fn totals_table(ui: &mut Ui, totals: &SpatialTotals) {
    let mut rows: Vec<(&String, &u64)> = totals.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::remainder().at_least(160.0))
        .column(Column::auto().at_least(100.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("State");
            });
            header.col(|ui| {
                ui.strong("Accidents");
            });
        })
        .body(|mut body| {
            for (name, total) in rows {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(name.as_str());
                    });
                    row.col(|ui| {
                        ui.label(group_thousands(*total));
                    });
                });
            }
        });
}
