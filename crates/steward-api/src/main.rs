use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use steward_api::{build_router, config::Config, state::AppState};
use steward_graph::{
    render_instructions, ConversationRunner, ThreadStore, DEFAULT_INSTRUCTIONS_TEMPLATE,
};
use steward_llm::{CompletionClient, OpenAIClient, OpenAIConfig, RunProvider};
use steward_persist::{ModelRelevanceJudge, NodeStore, PersistenceBuilder};
use steward_tools::{builtin_tools, BuiltinConfig, ToolRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Steward API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    // Model provider. Completions serve the relevance judge and the titler;
    // the run client is built once the tool set is known.
    let mut openai_config = OpenAIConfig::new(config.openai_api_key.clone())
        .with_assistant_name(config.llm.assistant_name.clone());
    if let Some(id) = &config.llm.assistant_id {
        openai_config = openai_config.with_assistant_id(id.clone());
    }
    if let Some(base_url) = &config.llm.base_url {
        openai_config = openai_config.with_base_url(base_url.clone());
    }
    let completions: Arc<dyn CompletionClient> =
        Arc::new(OpenAIClient::from_config(openai_config.clone())?);

    // Storage
    tracing::info!(backend = ?config.storage.backend, "Opening storage");
    let mut persistence = PersistenceBuilder::new()
        .backend(config.storage.backend)
        .database(config.storage.database.clone());
    if let Some(uri) = &config.mongodb_uri {
        persistence = persistence.mongodb_uri(uri.clone());
    }
    let persistence = persistence.build().await?;

    let judge = ModelRelevanceJudge::new(completions.clone()).with_model(config.llm.judge_model.clone());
    let nodes = Arc::new(NodeStore::new(persistence.nodes.clone()).with_judge(Arc::new(judge)));

    // Tools
    let mut builtin = BuiltinConfig::default();
    if let Some(token) = &config.google_access_token {
        builtin = builtin.with_google_access_token(token.clone());
    }
    if let Some(key) = &config.serper_api_key {
        builtin = builtin.with_serper_api_key(key.clone());
    }
    let registry = ToolRegistry::new(builtin_tools(nodes.clone(), &builtin))?;
    tracing::info!(tools = ?registry.names(), "Tools registered");

    let runner_config = config.runner_config();
    let assistant_instructions = runner_config
        .instructions
        .clone()
        .unwrap_or_else(|| render_instructions(DEFAULT_INSTRUCTIONS_TEMPLATE, chrono::Utc::now()));
    let provider: Arc<dyn RunProvider> = Arc::new(
        OpenAIClient::from_config(openai_config)?
            .with_assistant_model(config.llm.model.clone())
            .with_assistant_instructions(assistant_instructions)
            .with_assistant_tools(registry.schemas()),
    );

    // Conversations
    let threads = ThreadStore::new(persistence.threads.clone(), provider.clone())
        .with_titler(completions, config.llm.title_model.clone());
    let runner = ConversationRunner::builder()
        .threads(Arc::new(threads))
        .provider(provider)
        .registry(Arc::new(registry))
        .config(runner_config)
        .build()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, runner, nodes));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
