use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use steward_llm::{ToolCallRequest, ToolOutput};
use tokio::task::JoinHandle;

use crate::error::ToolError;
use crate::registry::ToolRegistry;
use crate::tool::ToolContext;

/// Prefix of every output produced for a failed call
pub const TOOL_FAILURE_PREFIX: &str = "Tool execution failed";

fn failure(reason: impl std::fmt::Display) -> String {
    format!("{}: {}", TOOL_FAILURE_PREFIX, reason)
}

/// Runs a batch of tool calls concurrently and collects one output per call.
///
/// Failures never escape a batch: unknown tools, malformed arguments,
/// handler errors, panics and timeouts all become error strings for the
/// call that caused them.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    batch_timeout: Option<Duration>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            batch_timeout: None,
        }
    }

    /// Bound on waiting for a whole batch. Calls still running at the
    /// deadline are reported as timed out and left to finish detached.
    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.batch_timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute every call and return outputs keyed by call id
    pub async fn execute_batch(
        &self,
        ctx: &ToolContext,
        calls: &[ToolCallRequest],
    ) -> HashMap<String, String> {
        let mut outputs = HashMap::with_capacity(calls.len());
        let mut pending: Vec<(String, String, JoinHandle<String>)> = Vec::new();

        for call in calls {
            tracing::info!(call_id = %call.call_id, tool = %call.tool_name, status = "queued", "tool call");

            match self.spawn_call(ctx, call) {
                Ok(handle) => pending.push((call.call_id.clone(), call.tool_name.clone(), handle)),
                Err(e) => {
                    tracing::warn!(
                        call_id = %call.call_id,
                        tool = %call.tool_name,
                        status = "failed",
                        error = %e,
                        "tool call"
                    );
                    outputs.insert(call.call_id.clone(), failure(e));
                }
            }
        }

        let deadline = self
            .batch_timeout
            .map(|t| tokio::time::Instant::now() + t);

        for (call_id, tool, handle) in pending {
            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let secs = self.batch_timeout.map(|t| t.as_secs()).unwrap_or_default();
                        tracing::warn!(%call_id, %tool, status = "failed", "tool call timed out");
                        outputs.insert(call_id, failure(ToolError::Timeout(secs)));
                        continue;
                    }
                },
                None => handle.await,
            };

            let output = joined.unwrap_or_else(|e| {
                tracing::error!(%call_id, %tool, status = "failed", error = %e, "tool task aborted");
                failure(ToolError::Aborted(e.to_string()))
            });
            outputs.insert(call_id, output);
        }

        outputs
    }

    /// Same as [`execute_batch`](Self::execute_batch), shaped for resubmission
    pub async fn execute_for_submission(
        &self,
        ctx: &ToolContext,
        calls: &[ToolCallRequest],
    ) -> Vec<ToolOutput> {
        let mut outputs = self.execute_batch(ctx, calls).await;
        calls
            .iter()
            .filter_map(|call| {
                outputs
                    .remove(&call.call_id)
                    .map(|output| ToolOutput::new(call.call_id.clone(), output))
            })
            .collect()
    }

    fn spawn_call(
        &self,
        ctx: &ToolContext,
        call: &ToolCallRequest,
    ) -> Result<JoinHandle<String>, ToolError> {
        let tool = self.registry.resolve(&call.tool_name)?;

        let args = call
            .arguments_value()
            .map_err(|e| ToolError::InvalidArguments {
                tool: call.tool_name.clone(),
                reason: e.to_string(),
            })?;
        if !matches!(args, Value::Object(_)) {
            return Err(ToolError::InvalidArguments {
                tool: call.tool_name.clone(),
                reason: "arguments must be a JSON object".to_string(),
            });
        }

        let ctx = ctx.clone();
        let call_id = call.call_id.clone();

        Ok(tokio::spawn(async move {
            let start = Instant::now();
            tracing::info!(%call_id, tool = %tool.name(), status = "started", "tool call");

            match tool.invoke(&ctx, args).await {
                Ok(output) => {
                    tracing::info!(
                        %call_id,
                        tool = %tool.name(),
                        status = "succeeded",
                        duration_ms = start.elapsed().as_millis() as u64,
                        "tool call"
                    );
                    output
                }
                Err(e) => {
                    tracing::warn!(
                        %call_id,
                        tool = %tool.name(),
                        status = "failed",
                        duration_ms = start.elapsed().as_millis() as u64,
                        error = %e,
                        "tool call"
                    );
                    failure(e)
                }
            }
        }))
    }
}
