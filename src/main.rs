use anyhow::Result;
use pixelgotchi::{app, config};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "pixelgotchi.log";

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(err) if err.not_found() => {}
        Err(err) => eprintln!("Failed to load .env: {err}"),
    }
}

// The terminal is in raw alternate-screen mode, so logs go to a file.
fn init_logging() {
    let file = config::log_dir().and_then(|dir| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))
            .map_err(anyhow::Error::from)
    });
    let Ok(file) = file else {
        return;
    };
    let filter =
        EnvFilter::try_from_env("PIXELGOTCHI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn main() -> Result<()> {
    load_dotenv();
    init_logging();
    let cfg = config::Config::from_env()?;
    app::run(cfg)
}
