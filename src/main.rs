//! Suicide Data Analysis - Statistics Dashboard
//!
//! Loads the country/year/sex/age suicide dataset, aggregates it and shows
//! the results as an interactive dashboard, or prints and exports them headless.

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use env_logger::Env;
use suicide_dashboard::charts::StaticChartRenderer;
use suicide_dashboard::config::{Cli, DashboardConfig};
use suicide_dashboard::dashboard::Dashboard;
use suicide_dashboard::gui::DashboardApp;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = DashboardConfig::resolve(&cli).context("reading configuration")?;
    log::debug!("Configuration: {config:?}");

    if cli.headless {
        return run_headless(&config);
    }

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Suicide Data Analysis"),
        ..Default::default()
    };

    eframe::run_native(
        "Suicide Data Analysis",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("window error: {e}"))
}

/// Print the report to stdout and export it when a directory is configured.
fn run_headless(config: &DashboardConfig) -> Result<()> {
    let dashboard = Dashboard::load(config)?;
    print!("{}", dashboard.report);

    if let Some(dir) = &config.export_dir {
        let files = StaticChartRenderer::export_report(&dashboard.report, dir)
            .with_context(|| format!("exporting to {}", dir.display()))?;
        println!("Exported {} files to {}", files.len(), dir.display());
    }
    Ok(())
}
