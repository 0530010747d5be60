use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatsim_gateway::server;
use chatsim_gateway::state::AppState;
use chatsim_gateway::Orchestrator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration before tracing so the configured level applies
    let config = chatsim_core::Config::load()?;

    // RUST_LOG wins over the configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.settings.logging.level.as_str().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Configuration loaded (language: {:?}, default rounds: {})",
        config.language(),
        config.settings.generation.default_rounds
    );

    for kind in config.providers.missing_api_keys() {
        warn!(
            "No API key configured for the {} provider; its requests will be rejected upstream",
            kind
        );
    }

    let orchestrator = Orchestrator::from_config(&config)?;
    for kind in chatsim_core::ProviderKind::ALL {
        let provider = config.providers.get(kind);
        info!("{} provider: {} ({})", kind, provider.model, provider.endpoint);
    }
    if config.dump_queries() {
        info!("Query dumps enabled under ./logs/queries");
    }

    let state = Arc::new(AppState::new(orchestrator));

    // Security: Verify localhost-only binding
    let host = config.settings.gateway.host.as_str();
    if host != "127.0.0.1" && host != "localhost" && host != "::1" {
        warn!(
            "Gateway binding to non-localhost address: {}. This may expose the API to remote access.",
            host
        );
    }

    let bind_addr = config.bind_addr();
    info!("Starting chatsim server on {}", bind_addr);

    server::run(state, &bind_addr).await
}
