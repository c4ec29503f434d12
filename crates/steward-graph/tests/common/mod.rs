#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use steward_llm::{
    CompletionClient, CompletionRequest, CompletionResponse, Role, RunEvent, RunEventStream,
    RunProvider, RunRequest, ThreadMessage, ToolOutput,
};
use steward_tools::{Tool, ToolContext};

/// Provider double that replays one scripted event list per run segment:
/// the first script answers `create_run`, each later one answers a
/// `submit_tool_outputs`.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<VecDeque<Vec<RunEvent>>>,
    pub calls: Mutex<Vec<String>>,
    pub appended: Mutex<Vec<(String, String)>>,
    pub submitted: Mutex<Vec<(String, Vec<ToolOutput>)>>,
    pub runs: Mutex<Vec<RunRequest>>,
    pub messages: Mutex<Vec<ThreadMessage>>,
    pub fail_thread_creation: bool,
    threads_created: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Vec<RunEvent>>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Default::default()
        }
    }

    pub fn failing_thread_creation() -> Self {
        Self {
            fail_thread_creation: true,
            ..Default::default()
        }
    }

    pub fn with_messages(self, messages: Vec<ThreadMessage>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn next_script(&self) -> Result<RunEventStream> {
        let events = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no script left"))?;
        Ok(futures::stream::iter(events.into_iter().map(Ok)).boxed())
    }
}

#[async_trait]
impl RunProvider for ScriptedProvider {
    async fn create_thread(&self) -> Result<String> {
        self.calls.lock().unwrap().push("create_thread".to_string());
        if self.fail_thread_creation {
            return Err(anyhow!("OpenAI API error (500): unavailable"));
        }
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{}", n))
    }

    async fn append_message(&self, thread_id: &str, role: Role, text: &str) -> Result<()> {
        assert_eq!(role, Role::User);
        self.calls.lock().unwrap().push("append_message".to_string());
        self.appended
            .lock()
            .unwrap()
            .push((thread_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn create_run(&self, request: RunRequest) -> Result<RunEventStream> {
        self.calls.lock().unwrap().push("create_run".to_string());
        self.runs.lock().unwrap().push(request);
        self.next_script()
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream> {
        self.calls.lock().unwrap().push("submit_tool_outputs".to_string());
        self.submitted
            .lock()
            .unwrap()
            .push((run_id.to_string(), outputs));
        self.next_script()
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>> {
        Ok(self.messages.lock().unwrap().clone())
    }
}

/// Tool double that counts invocations
pub struct CountingTool {
    name: &'static str,
    output: &'static str,
    pub invocations: AtomicUsize,
}

impl CountingTool {
    pub fn new(name: &'static str, output: &'static str) -> Self {
        Self {
            name,
            output,
            invocations: AtomicUsize::new(0),
        }
    }

    pub fn count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Tool for CountingTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "test tool"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({"type": "object", "properties": {}})
    }

    async fn invoke(&self, _ctx: &ToolContext, _args: Value) -> Result<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.to_string())
    }
}

/// Completion double that returns a fixed answer
pub struct CannedCompletion(pub &'static str);

#[async_trait]
impl CompletionClient for CannedCompletion {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse> {
        Ok(CompletionResponse {
            content: Some(self.0.to_string()),
            finish_reason: Some("stop".to_string()),
            raw: Value::Null,
        })
    }
}

pub fn requires_action(call_id: &str, tool: &str, arguments: &str) -> RunEvent {
    RunEvent::RequiresAction {
        run_id: "run_1".to_string(),
        thread_id: "thread_1".to_string(),
        tool_calls: vec![steward_llm::ToolCallRequest::new(call_id, tool, arguments)],
    }
}
