//! # Steward
//!
//! Backend for a conversational personal assistant. A user's message is run
//! against a hosted model thread, the model's text is streamed back as it
//! arrives, and the tool calls it makes along the way are dispatched
//! concurrently and resubmitted until the run ends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use steward::prelude::*;
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let openai = Arc::new(OpenAIClient::new(std::env::var("OPENAI_API_KEY")?)?);
//!     let storage = Persistence::in_memory();
//!
//!     let nodes = Arc::new(NodeStore::new(storage.nodes.clone()));
//!     let registry = ToolRegistry::new(builtin_tools(nodes, &BuiltinConfig::default()))?;
//!     let threads = ThreadStore::new(storage.threads.clone(), openai.clone());
//!
//!     let runner = ConversationRunner::builder()
//!         .threads(Arc::new(threads))
//!         .provider(openai)
//!         .registry(Arc::new(registry))
//!         .build()?;
//!
//!     let mut exchange = runner
//!         .run_exchange(ExchangeRequest::new("alice", "What's on my calendar today?"))
//!         .await?;
//!     while let Some(fragment) = exchange.next().await {
//!         print!("{}", fragment?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`steward-llm`**: run provider and completion interfaces, OpenAI Assistants client
//! - **`steward-persist`**: thread records, the datanode tree, storage backends, pruning
//! - **`steward-tools`**: tool trait, registry, concurrent dispatcher, built-in tools
//! - **`steward-graph`**: thread store and the conversation runner

pub mod prelude;

pub use steward_graph::{
    ConversationRunner, Exchange, ExchangeError, ExchangeRequest, RunState, RunnerBuilder,
    RunnerConfig, ThreadStore,
};

pub use steward_llm::{
    CompletionClient, CompletionRequest, CompletionResponse, Message, OpenAIClient, OpenAIConfig,
    Role, RunEvent, RunProvider, RunRequest, RunStatus, ThreadMessage, Tool as ToolSchema,
    ToolCallRequest, ToolOutput,
};

pub use steward_persist::{
    Datanode, InMemoryNodeRepository, InMemoryThreadRepository, ModelRelevanceJudge,
    NodePayload, NodeRepository, NodeStore, PersistError, Persistence, PersistenceBuilder,
    RelevanceJudge, StorageBackend, ThreadRecord, ThreadRepository, DEFAULT_NODE_TYPE, ROOT_NODE_ID,
};

#[cfg(feature = "mongodb")]
pub use steward_persist::MongoPersistenceClient;

pub use steward_tools::{
    builtin_tools, BuiltinConfig, Tool, ToolContext, ToolDispatcher, ToolError, ToolRegistry,
};
