use std::sync::Arc;

use serde_json::json;
use steward_persist::NodeStore;

use crate::tool::Tool;

pub mod calendar;
pub mod google;
pub mod nodes;
pub mod sheets;
pub mod web;

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const SERPER_API_BASE: &str = "https://google.serper.dev";

/// Credentials and endpoints for the built-in external tools
#[derive(Debug, Clone)]
pub struct BuiltinConfig {
    /// Enables calendar and spreadsheet tools
    pub google_access_token: Option<String>,
    /// Enables web search
    pub serper_api_key: Option<String>,
    pub google_calendar_base: String,
    pub google_sheets_base: String,
    pub serper_base: String,
}

impl Default for BuiltinConfig {
    fn default() -> Self {
        Self {
            google_access_token: None,
            serper_api_key: None,
            google_calendar_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            google_sheets_base: GOOGLE_SHEETS_API_BASE.to_string(),
            serper_base: SERPER_API_BASE.to_string(),
        }
    }
}

impl BuiltinConfig {
    pub fn with_google_access_token(mut self, token: impl Into<String>) -> Self {
        self.google_access_token = Some(token.into());
        self
    }

    pub fn with_serper_api_key(mut self, key: impl Into<String>) -> Self {
        self.serper_api_key = Some(key.into());
        self
    }
}

/// The default tool list. Node tools are always present; external tools
/// only when their credentials are configured.
pub fn builtin_tools(nodes: Arc<NodeStore>, config: &BuiltinConfig) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(nodes::GetNodesTool::new(nodes.clone())),
        Arc::new(nodes::GetNodeByIdTool::new(nodes.clone())),
        Arc::new(nodes::PruneNodesTool::new(nodes.clone())),
        Arc::new(nodes::AddDatanodeTool::new(nodes.clone())),
        Arc::new(nodes::EditDatanodeTool::new(nodes)),
    ];

    if let Some(token) = &config.google_access_token {
        let api = Arc::new(google::GoogleApi::new(
            token.clone(),
            config.google_calendar_base.clone(),
            config.google_sheets_base.clone(),
        ));
        tools.push(Arc::new(calendar::ListEventsTool::new(api.clone())));
        tools.push(Arc::new(calendar::AddCalendarEventTool::new(api.clone())));
        tools.push(Arc::new(calendar::UpdateOrCancelEventTool::new(api.clone())));
        tools.push(Arc::new(sheets::ReadSheetTool::new(api)));
    } else {
        tracing::info!("no Google access token, calendar and sheet tools disabled");
    }

    if let Some(key) = &config.serper_api_key {
        tools.push(Arc::new(web::WebSearchTool::new(
            key.clone(),
            config.serper_base.clone(),
        )));
    } else {
        tracing::info!("no Serper API key, web search disabled");
    }

    tools
}

/// Error body returned to the model for external failures
pub(crate) fn error_payload(status: u16, message: impl Into<String>) -> String {
    json!({ "error": message.into(), "status": status }).to_string()
}
