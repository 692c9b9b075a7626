mod app_dir;
mod preferences;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info};

use panbrot_render::Engine;

use preferences::Preferences;

const DEFAULT_OUTPUT_DIR: &str = "snapshots";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting PanBrot");

    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let prefs = Preferences::load();
    if !preferences::config_path().exists() {
        prefs.save();
    }

    match run(&prefs, &out_dir) {
        Ok(count) => {
            info!("Wrote {count} snapshots to {}", out_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(prefs: &Preferences, out_dir: &std::path::Path) -> panbrot_render::Result<usize> {
    let palette = prefs.palette.build()?;
    let engine = Engine::new(prefs.engine.clone(), palette)?;
    let steps = session::tour(prefs);
    let written = session::run(
        &engine,
        &steps,
        out_dir,
        Duration::from_secs(prefs.idle_timeout_secs),
    )?;
    Ok(written.len())
}
