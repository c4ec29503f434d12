pub mod types;
pub mod traits;
pub mod streaming;
pub mod config;
pub mod openai;

pub use traits::{
    CompletionClient, CompletionOptions, CompletionRequest, CompletionResponse,
    RunEventStream, RunProvider, RunRequest,
};

pub use streaming::{RunEvent, RunStatus};
pub use config::OpenAIConfig;
pub use openai::OpenAIClient;
pub use types::{FunctionDefinition, Message, Role, ThreadMessage, Tool, ToolCallRequest, ToolOutput};
