use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};

use super::google::GoogleApi;
use super::error_payload;
use crate::tool::{required_str, Tool, ToolContext};

pub struct ReadSheetTool {
    api: Arc<GoogleApi>,
}

impl ReadSheetTool {
    pub fn new(api: Arc<GoogleApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Tool for ReadSheetTool {
    fn name(&self) -> &str {
        "read_sheet"
    }

    fn description(&self) -> &str {
        "Read a range of cells from a Google Sheet and return the rows as JSON"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "spreadsheet_id": {"type": "string", "description": "ID of the Google Sheet to read"},
                "range": {"type": "string", "description": "A1 range to read, e.g. Sheet1!A1:D10"}
            },
            "required": ["spreadsheet_id", "range"]
        })
    }

    async fn invoke(&self, _ctx: &ToolContext, args: Value) -> Result<String> {
        let spreadsheet_id = required_str(&args, "spreadsheet_id")?;
        let range = required_str(&args, "range")?;

        let mut url = Url::parse(&self.api.sheets_base)
            .map_err(|e| anyhow::anyhow!("bad sheets url: {}", e))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("failed to build sheets url path"))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(spreadsheet_id)
            .push("values")
            .push(range);

        let body = match self.api.send(self.api.get(url.to_string())).await {
            Ok(body) => body,
            Err(failure) => return Ok(failure.into_payload()),
        };

        match body.get("values").and_then(Value::as_array) {
            Some(rows) if !rows.is_empty() => Ok(serde_json::to_string(rows)?),
            _ => Ok(error_payload(404, "No data found.")),
        }
    }
}
