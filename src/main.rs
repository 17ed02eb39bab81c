mod analysis;
mod app;
mod color;
mod config;
mod data;
mod error;
mod report;
mod state;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use app::DashboardApp;
use clap::{Parser, Subcommand};
use eframe::egui;

use analysis::decompose::ClassicalAdditive;
use config::AppConfig;
use data::filter::FilterSelection;
use report::{build_report, ReportRequest};
use state::AppState;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./dashboard.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the aggregations for one selection as JSON instead of opening the window
    Report {
        /// State name, or "All"
        #[arg(short, long)]
        state: Option<String>,
        /// First year (inclusive)
        #[arg(long)]
        from: Option<i32>,
        /// Last year (inclusive)
        #[arg(long)]
        to: Option<i32>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::resolve(cli.config.as_deref())?;

    match cli.command {
        Some(Commands::Report { state, from, to }) => {
            let snapshot = data::loader::load_snapshot(&config.data)?;
            let initial = FilterSelection::initial(&snapshot, &config.filters);
            let request = ReportRequest { state, from, to };
            let report = build_report(
                &snapshot,
                &initial,
                &request,
                &ClassicalAdditive,
                &config.analysis,
            )?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        None => run_gui(config),
    }
}

fn run_gui(config: AppConfig) -> anyhow::Result<()> {
    let mut state = AppState::new(config);
    match data::loader::load_snapshot(&state.config.data) {
        Ok(snapshot) => state.set_snapshot(Arc::new(snapshot)),
        Err(e) => {
            log::error!("Failed to load data: {e}");
            state.set_load_error(format!("Error: {e}"));
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Road Accident Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the dashboard window")
}
