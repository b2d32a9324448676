// Main entry point - Configuration, feed loading and report output
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use station_telemetry::application::dashboard_service::WindDashboardService;
use station_telemetry::infrastructure::config::load_analysis_config;
use station_telemetry::infrastructure::feed::WindFeed;
use station_telemetry::presentation::report::write_dashboard_json;

fn main() -> anyhow::Result<()> {
    // Initialize tracing on stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let feed_path = std::env::args()
        .nth(1)
        .context("usage: wind-analysis <wind.json>")?;

    // Load configuration
    let config = load_analysis_config().context("Failed to load analysis configuration")?;

    // Load feed
    let file = File::open(&feed_path).with_context(|| format!("Failed to open {}", feed_path))?;
    let feed = WindFeed::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse wind feed {}", feed_path))?;
    if feed.dropped > 0 {
        tracing::warn!("Dropped {} samples with unparseable timestamps", feed.dropped);
    }

    let station = Path::new(&feed_path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Station");

    let service = WindDashboardService::new(config)?;
    let dashboard = service.build_dashboard(station, &feed)?;
    tracing::info!(
        "Built dashboard with {} tiles, {} charts from {} speed / {} direction samples",
        dashboard.tiles.len(),
        dashboard.charts.len(),
        feed.winds.len(),
        feed.dirs.len()
    );

    write_dashboard_json(io::stdout().lock(), &dashboard, true).context("Failed to write report")?;
    println!();

    Ok(())
}
