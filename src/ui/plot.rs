use std::ops::RangeInclusive;

use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{GridMark, Line, Plot, PlotPoints, Points};

use crate::analysis::aggregate::{month_ordinal, ordinal_to_month, Decomposition, MonthlyPoint};
use crate::analysis::decompose::Components;

const SERIES_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

// ---------------------------------------------------------------------------
// Monthly trend (line chart)
// ---------------------------------------------------------------------------

/// Render the monthly accident trend.
pub fn trend_plot(ui: &mut Ui, monthly: &[MonthlyPoint]) {
    if monthly.is_empty() {
        ui.label(RichText::new("No accidents recorded for this selection.").weak());
        return;
    }

    let points: PlotPoints = monthly
        .iter()
        .map(|p| [month_ordinal(p.date), p.accidents as f64])
        .collect();

    Plot::new("monthly_trend")
        .height(260.0)
        .x_axis_label("Date")
        .y_axis_label("Accidents")
        .x_axis_formatter(month_axis_label)
        .label_formatter(|_name, value| {
            let month = ordinal_to_month(value.x.round())
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default();
            format!("{month}\n{:.0} accidents", value.y)
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).name("Accidents").color(SERIES_COLOR).width(1.5));
        });
}

fn month_axis_label(mark: GridMark, _range: &RangeInclusive<f64>) -> String {
    ordinal_to_month(mark.value)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Seasonal decomposition (four stacked panels)
// ---------------------------------------------------------------------------

/// Render observed / trend / seasonal / residual, or the short-series warning.
pub fn decomposition_plot(ui: &mut Ui, monthly: &[MonthlyPoint], decomposition: &Decomposition) {
    let components = match decomposition {
        Decomposition::Ready(c) => c,
        Decomposition::Insufficient { required, .. } => {
            ui.colored_label(
                Color32::from_rgb(230, 160, 30),
                format!("Not enough data points for decomposition (need at least {required})."),
            );
            return;
        }
    };

    let xs: Vec<f64> = monthly.iter().map(|p| month_ordinal(p.date)).collect();
    let Components {
        observed,
        trend,
        seasonal,
        residual,
        ..
    } = components;

    let defined = |values: &[Option<f64>]| -> Vec<[f64; 2]> {
        xs.iter()
            .zip(values)
            .filter_map(|(&x, v)| v.map(|v| [x, v]))
            .collect()
    };
    let all = |values: &[f64]| -> Vec<[f64; 2]> {
        xs.iter().zip(values).map(|(&x, &v)| [x, v]).collect()
    };

    component_panel(ui, "Observed", all(observed.as_slice()), false);
    component_panel(ui, "Trend", defined(trend.as_slice()), false);
    component_panel(ui, "Seasonal", all(seasonal.as_slice()), false);
    component_panel(ui, "Residual", defined(residual.as_slice()), true);
}

fn component_panel(ui: &mut Ui, name: &str, points: Vec<[f64; 2]>, scatter: bool) {
    Plot::new(("decomposition", name))
        .height(120.0)
        .y_axis_label(name)
        .x_axis_formatter(month_axis_label)
        .link_axis("decomposition_x", [true, false])
        .link_cursor("decomposition_x", [true, false])
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            let series = PlotPoints::new(points);
            if scatter {
                plot_ui.points(Points::new(series).name(name).color(SERIES_COLOR).radius(2.0));
            } else {
                plot_ui.line(Line::new(series).name(name).color(SERIES_COLOR).width(1.2));
            }
        });
}
