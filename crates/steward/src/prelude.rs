//! Prelude module for convenient imports
//!
//! ```rust
//! use steward::prelude::*;
//! ```

pub use crate::{
    builtin_tools, BuiltinConfig, CompletionClient, ConversationRunner, Datanode, Exchange,
    ExchangeError, ExchangeRequest, NodePayload, NodeStore, OpenAIClient, Persistence,
    PersistenceBuilder, RunProvider, RunnerConfig, ThreadStore, Tool, ToolContext, ToolRegistry,
};
