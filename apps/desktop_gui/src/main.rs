use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use anyhow::Context;
use clap::Parser;
use client_core::config::{load_settings_from, Settings, DEFAULT_CONFIG_FILE};
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::{commands::BackendCommand, runtime};
use crate::controller::events::UiEvent;
use crate::ui::BlogDeskApp;

#[derive(Parser, Debug)]
#[command(name = "blog_desk", version, about = "Desktop client for a hosted blog backend.")]
struct Cli {
    /// TOML settings file; missing is fine.
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    #[arg(long, value_name = "URL")]
    supabase_url: Option<String>,
    #[arg(long, value_name = "KEY")]
    anon_key: Option<String>,
    /// Where the signed-in session is kept between runs.
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

/// File and environment first, then command-line flags.
fn resolve_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = load_settings_from(&cli.config)?;
    if let Some(url) = &cli.supabase_url {
        settings.supabase_url = url.clone();
    }
    if let Some(key) = &cli.anon_key {
        settings.anon_key = key.clone();
    }
    if let Some(dir) = &cli.data_dir {
        settings.session_file = Some(dir.join("session.json"));
    } else if settings.session_file.is_none() {
        settings.session_file =
            dirs::data_local_dir().map(|dir| dir.join("blog_desk").join("session.json"));
    }
    settings.base_url()?;
    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli).context("failed to load settings")?;
    if settings.anon_key.is_empty() {
        tracing::warn!("no anon key configured; backend requests will be rejected");
    }

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    let _backend = runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Blog Desk")
            .with_inner_size([1024.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Blog Desk",
        options,
        Box::new(move |_cc| Ok(Box::new(BlogDeskApp::new(cmd_tx, ui_rx)))),
    )
    .map_err(|err| anyhow::anyhow!("failed to start the window: {err}"))
}
