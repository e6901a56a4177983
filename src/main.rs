mod app;
mod util;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, anyhow};
use clap::Parser;
use netview::NetworkOptions;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Initial window width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,
    #[arg(long, default_value_t = 800)]
    height: u32,
    /// JSON file with view options (camelCase keys).
    #[arg(long)]
    config: Option<PathBuf>,
    /// JSON graph served instead of the synthetic lattice.
    #[arg(long)]
    data: Option<PathBuf>,
    /// Simulated fetch latency.
    #[arg(long, default_value_t = 120)]
    latency_ms: u64,
    #[arg(long, default_value_t = 80)]
    jitter_ms: u64,
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn load_options(path: Option<&PathBuf>) -> anyhow::Result<NetworkOptions> {
    let Some(path) = path else {
        return Ok(NetworkOptions {
            nodes_selectable: true,
            edges_selectable: true,
            highlight_hover: true,
            highlight_neighbors: true,
            show_navigation_controls: true,
            mouse_wheel_zoom: true,
            ..NetworkOptions::default()
        });
    };

    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read options from {}", path.display()))?;
    let options = NetworkOptions::from_json(&json)
        .with_context(|| format!("invalid options in {}", path.display()))?;
    options
        .validate()
        .with_context(|| format!("unusable view options in {}", path.display()))?;
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("netview=info")),
        )
        .init();

    let args = Args::parse();
    let options = load_options(args.config.as_ref())?;
    tracing::info!(?options, "starting viewer");

    let config = app::AppConfig {
        options,
        screen_size: [args.width, args.height],
        data: args.data,
        latency: Duration::from_millis(args.latency_ms),
        jitter: Duration::from_millis(args.jitter_ms),
        seed: args.seed,
    };
    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([args.width as f32, args.height as f32]),
        ..Default::default()
    };

    eframe::run_native(
        "netview",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::NetworkApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
