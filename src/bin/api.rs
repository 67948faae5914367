use portfolio_query_agent::{
    agent::QueryAgent,
    api::start_server,
    config::AppConfig,
    health::HealthAggregator,
    reasoner::GroqReasoner,
    tools::{DocumentStoreTool, RelationalStoreTool, StoreTool, ToolRegistry},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set; questions will fail until it is configured");
    }

    info!("Portfolio Query Agent - API server");
    info!("Port: {}", config.port);

    // Create components
    let backend = Arc::new(GroqReasoner::new(
        config.groq_api_key.clone().unwrap_or_default(),
    ));

    let document = Arc::new(DocumentStoreTool::connect(config.mongodb_uri.as_deref()).await);
    let relational = Arc::new(RelationalStoreTool::connect(config.mysql_uri.as_deref()));
    let adapters: Vec<Arc<dyn StoreTool>> = vec![document, relational];

    let registry = ToolRegistry::from_tools(adapters.clone());
    info!("Registered {} store tool(s)", registry.len());

    let agent = Arc::new(QueryAgent::new(backend.clone(), registry));
    let health = Arc::new(HealthAggregator::new(backend, adapters));

    info!("Agent initialized, starting API server");

    start_server(agent, health, config.port).await?;

    Ok(())
}
