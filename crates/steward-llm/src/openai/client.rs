// OpenAI Assistants (threads, runs) and Chat Completions over plain HTTP

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Response;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;

use crate::config::OpenAIConfig;
use crate::streaming::parse_run_sse_stream;
use crate::traits::{
    CompletionClient, CompletionRequest, CompletionResponse, RunEventStream, RunProvider,
    RunRequest,
};
use crate::types::{Role, ThreadMessage, Tool, ToolOutput};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: &str = "assistants=v2";
const DEFAULT_ASSISTANT_MODEL: &str = "gpt-4o";

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
    assistant_name: String,
    assistant_model: String,
    assistant_instructions: Option<String>,
    assistant_tools: Vec<Tool>,
    assistant_id: OnceCell<String>,
}

impl OpenAIClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(OpenAIConfig::new(api_key))
    }

    pub fn from_config(config: OpenAIConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("OpenAI-Beta", HeaderValue::from_static(ASSISTANTS_BETA));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        let assistant_id = match config.assistant_id {
            Some(id) => OnceCell::new_with(Some(id)),
            None => OnceCell::new(),
        };

        Ok(Self {
            http_client,
            base_url: config
                .base_url
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            assistant_name: config.assistant_name,
            assistant_model: DEFAULT_ASSISTANT_MODEL.to_string(),
            assistant_instructions: None,
            assistant_tools: Vec::new(),
            assistant_id,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model recorded on a lazily created assistant. Runs pass their own model.
    pub fn with_assistant_model(mut self, model: impl Into<String>) -> Self {
        self.assistant_model = model.into();
        self
    }

    pub fn with_assistant_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.assistant_instructions = Some(instructions.into());
        self
    }

    /// Tools advertised on a lazily created assistant
    pub fn with_assistant_tools(mut self, tools: Vec<Tool>) -> Self {
        self.assistant_tools = tools;
        self
    }

    /// Assistant id used for runs, creating the assistant once per process
    pub async fn assistant_id(&self) -> Result<&str> {
        let id = self
            .assistant_id
            .get_or_try_init(|| self.create_assistant())
            .await?;
        Ok(id.as_str())
    }

    async fn create_assistant(&self) -> Result<String> {
        let mut payload = json!({
            "name": self.assistant_name,
            "model": self.assistant_model,
        });
        if let Some(obj) = payload.as_object_mut() {
            if let Some(instructions) = &self.assistant_instructions {
                obj.insert("instructions".to_string(), json!(instructions));
            }
            if !self.assistant_tools.is_empty() {
                obj.insert("tools".to_string(), serde_json::to_value(&self.assistant_tools)?);
            }
        }

        let response = self.post("assistants", &payload).await?;
        let created: IdObject = response
            .json()
            .await
            .context("Failed to parse assistant")?;

        tracing::info!(assistant_id = %created.id, "created assistant");
        Ok(created.id)
    }

    async fn post(&self, path: &str, payload: &Value) -> Result<Response> {
        let response = self
            .http_client
            .post(format!("{}/{}", self.base_url, path))
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
    }
    Ok(response)
}

#[async_trait]
impl RunProvider for OpenAIClient {
    async fn create_thread(&self) -> Result<String> {
        let response = self.post("threads", &json!({})).await?;
        let thread: IdObject = response
            .json()
            .await
            .context("Failed to parse thread")?;
        Ok(thread.id)
    }

    async fn append_message(&self, thread_id: &str, role: Role, text: &str) -> Result<()> {
        let payload = json!({
            "role": role.as_str(),
            "content": text,
        });
        self.post(&format!("threads/{}/messages", thread_id), &payload)
            .await?;
        Ok(())
    }

    async fn create_run(&self, request: RunRequest) -> Result<RunEventStream> {
        let assistant_id = self.assistant_id().await?.to_string();

        let mut payload = json!({
            "assistant_id": assistant_id,
            "model": request.model,
            "stream": true,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(instructions) = request.instructions {
                obj.insert("instructions".to_string(), json!(instructions));
            }
            if !request.tools.is_empty() {
                obj.insert("tools".to_string(), serde_json::to_value(&request.tools)?);
            }
        }

        let response = self
            .post(&format!("threads/{}/runs", request.thread_id), &payload)
            .await?;

        Ok(parse_run_sse_stream(response))
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunEventStream> {
        let payload = json!({
            "tool_outputs": outputs,
            "stream": true,
        });

        let response = self
            .post(
                &format!("threads/{}/runs/{}/submit_tool_outputs", thread_id, run_id),
                &payload,
            )
            .await?;

        Ok(parse_run_sse_stream(response))
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let response = self
            .http_client
            .get(format!("{}/threads/{}/messages", self.base_url, thread_id))
            .query(&[("order", "asc"), ("limit", "100")])
            .send()
            .await
            .context("Failed to send request")?;

        let page: MessagePage = ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse messages")?;

        Ok(page
            .data
            .into_iter()
            .map(|m| ThreadMessage {
                role: m.role,
                text: m
                    .content
                    .into_iter()
                    .filter_map(|c| c.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n"),
                created_at: m.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| json!({"role": m.role(), "content": m.content()}))
            .collect();

        let mut payload = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(obj) = payload.as_object_mut() {
            if let Some(temp) = request.options.temperature {
                obj.insert("temperature".to_string(), json!(temp));
            }
            if let Some(max_tokens) = request.options.max_tokens {
                obj.insert("max_tokens".to_string(), json!(max_tokens));
            }
            if request.options.json_mode {
                obj.insert("response_format".to_string(), json!({"type": "json_object"}));
            }
        }

        let raw: Value = self
            .post("chat/completions", &payload)
            .await?
            .json()
            .await
            .context("Failed to parse response")?;

        let choice = raw.get("choices").and_then(|c| c.get(0));
        Ok(CompletionResponse {
            content: choice
                .and_then(|c| c.pointer("/message/content"))
                .and_then(Value::as_str)
                .map(str::to_string),
            finish_reason: choice
                .and_then(|c| c.get("finish_reason"))
                .and_then(Value::as_str)
                .map(str::to_string),
            raw,
        })
    }
}

// ============================================================================
// OPENAI-SPECIFIC RESPONSE TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessagePage {
    data: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Vec<WireContent>,
    #[serde(default)]
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireContent {
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}
