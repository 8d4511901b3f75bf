use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use email_drafter::api::{AppState, api_routes};
use email_drafter::config::{AppConfig, DraftResources};
use email_drafter::llm::create_provider;
use email_drafter::pipeline::processor::DraftProcessor;
use email_drafter::pipeline::refine::RefinementOrchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG wins, then LOG_LEVEL, then info
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| {
            std::env::var("LOG_LEVEL")
                .ok()
                .filter(|level| !level.trim().is_empty())
                .and_then(|level| EnvFilter::try_new(level).ok())
        })
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid environment configuration")?;

    // Load every resource once, before accepting traffic
    let resources = Arc::new(
        DraftResources::load_async(&config.config_dir)
            .await
            .with_context(|| format!("Failed to load resources from {}", config.config_dir.display()))?,
    );
    let llm = create_provider(&config.llm).context("Failed to create generation client")?;

    eprintln!("✉️  Email Drafter v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Strategy: {}", config.strategy);
    eprintln!("   Model: {}", llm.model_name());
    eprintln!("   Config: {}", config.config_dir.display());
    eprintln!("   API: http://0.0.0.0:{}/draft", config.port);

    let state = AppState {
        processor: Arc::new(DraftProcessor::new(Arc::clone(&resources), config.strategy)),
        orchestrator: Arc::new(RefinementOrchestrator::new(llm, resources)),
    };
    let app = api_routes(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Server started");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
