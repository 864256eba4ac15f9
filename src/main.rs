// Headless entry point: load the task list, run every enabled watcher until Ctrl-C.

use std::sync::Arc;
use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fetchx_lib::config::CONFIG_FILE;
use fetchx_lib::{JsonConfigStore, PollSettings, Supervisor, TracingSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)         // Remove file path
        .with_line_number(false)  // Remove line numbers
        .with_thread_ids(false)   // Remove thread IDs
        .with_thread_names(false) // Remove thread names
        .with_target(false)       // Remove module path
        .with_ansi(true)         // Keep colored output
        .with_writer(std::io::stdout)
        .compact()               // Use compact formatter instead of pretty
        .init();

    info!("=== FetchX Starting ===");

    let config_path = std::env::var("FETCHX_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
    let store = Arc::new(JsonConfigStore::new(&config_path));
    let supervisor = Supervisor::load(store, Arc::new(TracingSink), PollSettings::default())
        .with_context(|| format!("failed to load config from {config_path}"))?;

    supervisor.start_enabled().await;
    info!("Watching {} task(s), press Ctrl-C to exit", supervisor.len());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("Shutting down");
    supervisor.stop_all().await;
    Ok(())
}
