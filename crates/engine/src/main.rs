//! Marriage engine - Main entry point.

use marriage_engine::infrastructure::event_bus::MarriageEventBus;
use marriage_engine::{App, EngineConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marriage_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting marriage engine");

    let config = EngineConfig::from_env();
    tracing::info!(db_path = %config.db_path, preload = config.preload.len(), "Loaded configuration");

    // Listeners are registered here by the host before the app starts
    let bus = MarriageEventBus::new();
    let app = App::start(&config, bus).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    app.shutdown().await;
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");
    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
