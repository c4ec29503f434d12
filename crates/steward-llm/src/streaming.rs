use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use anyhow::{Context, Result};
use futures::{Stream, StreamExt};
use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::types::ToolCallRequest;

/// One event of a model run, as seen by the orchestration layer.
///
/// A run's stream carries any number of `TextDelta` and `RequiresAction`
/// events and ends with exactly one terminal variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    TextDelta {
        text: String,
    },

    /// The run is suspended until outputs for every call are submitted
    RequiresAction {
        run_id: String,
        thread_id: String,
        tool_calls: Vec<ToolCallRequest>,
    },

    Completed,

    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    Cancelling,
    Cancelled,
    Expired,
    StepFailed,
    StepCancelled,

    /// In-progress markers and anything else the runner does not act on
    Other {
        kind: String,
    },
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed,
    Cancelling,
    Cancelled,
    Expired,
    StepFailed,
    StepCancelled,
}

impl RunStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::StepFailed => "step_failed",
            Self::StepCancelled => "step_cancelled",
        };
        f.write_str(s)
    }
}

impl RunEvent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    /// `Some` for the variants that end a run's stream
    pub fn terminal_status(&self) -> Option<RunStatus> {
        match self {
            Self::Completed => Some(RunStatus::Completed),
            Self::Failed { .. } => Some(RunStatus::Failed),
            Self::Cancelling => Some(RunStatus::Cancelling),
            Self::Cancelled => Some(RunStatus::Cancelled),
            Self::Expired => Some(RunStatus::Expired),
            Self::StepFailed => Some(RunStatus::StepFailed),
            Self::StepCancelled => Some(RunStatus::StepCancelled),
            Self::TextDelta { .. } | Self::RequiresAction { .. } | Self::Other { .. } => None,
        }
    }
}

// Wire shapes of the Assistants streaming API. Only the fields the runner
// needs are modelled.

#[derive(Debug, Deserialize)]
struct MessageDelta {
    delta: MessageDeltaBody,
}

#[derive(Debug, Deserialize)]
struct MessageDeltaBody {
    #[serde(default)]
    content: Vec<DeltaContent>,
}

#[derive(Debug, Deserialize)]
struct DeltaContent {
    #[serde(default)]
    text: Option<DeltaText>,
}

#[derive(Debug, Deserialize)]
struct DeltaText {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    thread_id: String,
    #[serde(default)]
    required_action: Option<RequiredAction>,
    #[serde(default)]
    last_error: Option<LastError>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    submit_tool_outputs: SubmitToolOutputs,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputs {
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct LastError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<LastError>,
}

/// Decode one server-sent event into a [`RunEvent`].
///
/// Returns `Ok(None)` for events that carry nothing for the caller
/// (the `done` sentinel and empty text deltas).
pub fn decode_run_event(event: &str, data: &str) -> Result<Option<RunEvent>> {
    let decoded = match event {
        "thread.message.delta" => {
            let delta: MessageDelta = serde_json::from_str(data)
                .with_context(|| format!("Failed to parse message delta: {}", data))?;
            let text: String = delta
                .delta
                .content
                .into_iter()
                .filter_map(|c| c.text.and_then(|t| t.value))
                .collect();
            if text.is_empty() {
                return Ok(None);
            }
            RunEvent::TextDelta { text }
        }
        "thread.run.requires_action" => {
            let run: RunObject = serde_json::from_str(data)
                .with_context(|| format!("Failed to parse requires_action run: {}", data))?;
            let tool_calls = run
                .required_action
                .map(|a| a.submit_tool_outputs.tool_calls)
                .unwrap_or_default()
                .into_iter()
                .map(|tc| ToolCallRequest::new(tc.id, tc.function.name, tc.function.arguments))
                .collect();
            RunEvent::RequiresAction {
                run_id: run.id,
                thread_id: run.thread_id,
                tool_calls,
            }
        }
        "thread.run.completed" => RunEvent::Completed,
        "thread.run.failed" => {
            let reason = serde_json::from_str::<RunObject>(data)
                .ok()
                .and_then(|run| run.last_error)
                .and_then(|e| e.message);
            RunEvent::Failed { reason }
        }
        "thread.run.cancelling" => RunEvent::Cancelling,
        "thread.run.cancelled" => RunEvent::Cancelled,
        "thread.run.expired" => RunEvent::Expired,
        "thread.run.step.failed" => RunEvent::StepFailed,
        "thread.run.step.cancelled" => RunEvent::StepCancelled,
        "error" => {
            let message = serde_json::from_str::<ErrorEnvelope>(data)
                .ok()
                .and_then(|e| e.message.or_else(|| e.error.and_then(|inner| inner.message)))
                .unwrap_or_else(|| data.to_string());
            anyhow::bail!("Run stream error: {}", message);
        }
        "done" => return Ok(None),
        other => RunEvent::Other {
            kind: other.to_string(),
        },
    };

    Ok(Some(decoded))
}

/// Parse an Assistants API SSE response into run events.
///
/// The stream ends after the `done` sentinel or when the body closes.
pub fn parse_run_sse_stream(
    response: Response,
) -> Pin<Box<dyn Stream<Item = Result<RunEvent>> + Send>> {
    let stream = response.bytes_stream();

    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(stream);
        let mut buffer = VecDeque::with_capacity(8192);
        let mut current_event: Option<String> = None;

        'outer: while let Some(chunk_result) = byte_chunks.next().await {
            let bytes = match chunk_result {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    break;
                }
            };
            buffer.extend(bytes);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();

                let Ok(line_str) = std::str::from_utf8(&line_bytes) else {
                    continue;
                };
                let line = line_str.trim();

                // Blank line closes the current event
                if line.is_empty() {
                    current_event = None;
                    continue;
                }

                if let Some(name) = line.strip_prefix("event:") {
                    current_event = Some(name.trim().to_string());
                    continue;
                }

                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();

                if data == "[DONE]" {
                    break 'outer;
                }

                let event = current_event.as_deref().unwrap_or("message");
                match decode_run_event(event, data) {
                    Ok(Some(run_event)) => yield Ok(run_event),
                    Ok(None) => {
                        if event == "done" {
                            break 'outer;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break 'outer;
                    }
                }
            }
        }
    })
}
