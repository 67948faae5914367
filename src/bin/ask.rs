use portfolio_query_agent::{
    agent::QueryAgent,
    config::AppConfig,
    reasoner::GroqReasoner,
    tools::{DocumentStoreTool, RelationalStoreTool, StoreTool, ToolRegistry},
};
use std::sync::Arc;

/// One-shot CLI: answer a single question and print the envelope as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: ask <question>");
        eprintln!("example: ask \"List clients from New York\"");
        std::process::exit(2);
    }

    let config = AppConfig::from_env();

    let backend = Arc::new(GroqReasoner::new(
        config.groq_api_key.clone().unwrap_or_default(),
    ));
    let document = Arc::new(DocumentStoreTool::connect(config.mongodb_uri.as_deref()).await);
    let relational = Arc::new(RelationalStoreTool::connect(config.mysql_uri.as_deref()));
    let adapters: Vec<Arc<dyn StoreTool>> = vec![document, relational];
    let registry = ToolRegistry::from_tools(adapters);

    let agent = QueryAgent::new(backend, registry);

    match agent.orchestrate(&question).await {
        Ok(envelope) => {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Err(error) => {
            eprintln!("{}", error.user_message());
            Err(Box::new(error) as Box<dyn std::error::Error>)
        }
    }
}
