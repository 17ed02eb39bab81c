use eframe::egui::{self, RichText, ScrollArea};

use crate::state::AppState;
use crate::ui::{map, panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: title and dataset info ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: metrics, charts, map ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let (Some(snapshot), Some(view)) = (&self.state.snapshot, &self.state.view) else {
                ui.centered_and_justified(|ui| {
                    let msg = self
                        .state
                        .status_message
                        .as_deref()
                        .unwrap_or("No dataset loaded.");
                    ui.heading(RichText::new(msg).color(egui::Color32::RED));
                });
                return;
            };

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.heading("Road Accident Pattern Analysis");
                    ui.add_space(6.0);
                    panels::metrics_row(ui, &view.summary);
                    ui.separator();

                    ui.heading("Monthly Accident Trend");
                    plot::trend_plot(ui, &view.monthly);
                    ui.separator();

                    ui.heading("Seasonal Decomposition (Additive)");
                    plot::decomposition_plot(ui, &view.monthly, &view.decomposition);
                    ui.separator();

                    ui.heading("Accident Map (Choropleth by State)");
                    map::choropleth(ui, snapshot, view, self.state.scale.as_ref());
                    ui.separator();

                    ui.heading("Accidents by State");
                    panels::totals_table(ui, &view.spatial);
                });
        });
    }
}
