use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Per-call context handed to every tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolContext {
    /// Whose data the call may touch
    pub tenant: String,
}

impl ToolContext {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
        }
    }
}

/// A named capability the model may request.
///
/// `invoke` receives the call's arguments as a JSON object and returns the
/// text fed back to the model. An `Err` becomes an error string for that
/// call only.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters(&self) -> Value;

    async fn invoke(&self, ctx: &ToolContext, args: Value) -> Result<String>;

    /// Schema entry advertised to the model
    fn schema(&self) -> steward_llm::Tool {
        steward_llm::Tool::new(self.name(), self.description(), self.parameters())
    }
}

/// Required string argument
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing required string argument `{}`", key))
}

pub(crate) fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}
