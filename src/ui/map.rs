use std::collections::HashMap;

use eframe::egui::{self, RichText, Sense, Stroke, Ui};
use egui_plot::{Plot, PlotPoints, Polygon};

use crate::analysis::aggregate::DashboardView;
use crate::color::{ChoroplethScale, NO_DATA, OUTLINE};
use crate::data::model::Snapshot;

// ---------------------------------------------------------------------------
// Choropleth map
// ---------------------------------------------------------------------------

/// Render state boundaries shaded by accident total, with a legend on the right.
pub fn choropleth(ui: &mut Ui, snapshot: &Snapshot, view: &DashboardView, scale: Option<&ChoroplethScale>) {
    if snapshot.boundaries.is_empty() {
        ui.label(RichText::new("No boundary polygons loaded.").weak());
        return;
    }

    let totals: HashMap<usize, u64> = view.joined.matched.iter().copied().collect();
    let hover_totals = view.spatial.clone();

    ui.horizontal_top(|ui: &mut Ui| {
        let map_width = (ui.available_width() - 180.0).max(200.0);

        Plot::new("choropleth")
            .width(map_width)
            .height(480.0)
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid([false, false])
            .allow_scroll(false)
            .label_formatter(move |name, _value| match hover_totals.get(name) {
                Some(total) => format!("{name}\n{total} accidents"),
                None if name.is_empty() => String::new(),
                None => format!("{name}\nno data"),
            })
            .show(ui, |plot_ui| {
                for (i, boundary) in snapshot.boundaries.iter().enumerate() {
                    let fill = match (totals.get(&i), scale) {
                        (Some(&total), Some(scale)) => scale.color_for(total),
                        _ => NO_DATA,
                    };
                    for polygon in &boundary.geometry {
                        let ring: PlotPoints = polygon
                            .exterior()
                            .coords()
                            .map(|c| [c.x, c.y])
                            .collect();
                        plot_ui.polygon(
                            Polygon::new(ring)
                                .name(&boundary.name)
                                .fill_color(fill)
                                .stroke(Stroke::new(1.0, OUTLINE)),
                        );
                    }
                }
            });

        ui.vertical(|ui: &mut Ui| {
            ui.strong("Total Accidents");
            match scale {
                Some(scale) => legend(ui, scale),
                None => {
                    ui.label(RichText::new("No data for this selection.").weak());
                }
            }
        });
    });

    if !view.joined.unmatched.is_empty() {
        ui.label(
            RichText::new(format!(
                "Not on map (no matching boundary): {}",
                view.joined.unmatched.join(", ")
            ))
            .weak()
            .small(),
        );
    }
}

fn legend(ui: &mut Ui, scale: &ChoroplethScale) {
    for (label, color) in scale.legend_entries() {
        ui.horizontal(|ui: &mut Ui| {
            let (rect, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
            ui.painter().rect_filled(rect, 2.0, color);
            ui.label(label);
        });
    }
}
