pub mod error;
pub mod tool;
pub mod registry;
pub mod dispatcher;
pub mod builtin;

pub use error::ToolError;
pub use tool::{Tool, ToolContext};
pub use registry::ToolRegistry;
pub use dispatcher::{ToolDispatcher, TOOL_FAILURE_PREFIX};
pub use builtin::{builtin_tools, BuiltinConfig};
