//! Logging initialization.
//!
//! Reads `RUST_LOG` (filter, default `info`) and `LOG_FILE` (path) from env, e.g. via
//! `.env`. With `LOG_FILE` logs are appended there as plain text; otherwise they go to
//! stderr so stdout carries only the answer.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).try_init()?;
        tracing::info!(path = %path, "thoughtree logging to file");
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(filter);
        tracing_subscriber::registry().with(stderr_layer).try_init()?;
    }
    Ok(())
}
