use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    /// The model asked for a name with no handler
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Tool timed out after {0}s")]
    Timeout(u64),

    #[error("Tool task aborted: {0}")]
    Aborted(String),
}
