use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::error_payload;
use crate::tool::{required_str, Tool, ToolContext};

/// Google results through the Serper API
pub struct WebSearchTool {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl WebSearchTool {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web and return relevant results for the provided query"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query to send to the web search engine"}
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<String> {
        let query = required_str(&args, "query")?;
        tracing::debug!(query, "web search");

        let resp = match self
            .http
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "q": query }))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => return Ok(error_payload(500, e.to_string())),
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(error_payload(
                status.as_u16(),
                format!("HTTP error: {} {}", status, body),
            ));
        }

        match resp.json::<Value>().await {
            Ok(results) => Ok(results.to_string()),
            Err(_) => Ok(error_payload(500, "JSON decoding error")),
        }
    }
}
