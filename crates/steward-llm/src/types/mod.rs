pub mod message;
pub mod tool;

pub use message::{Message, Role, ThreadMessage};
pub use tool::{FunctionDefinition, Tool, ToolCallRequest, ToolOutput};
