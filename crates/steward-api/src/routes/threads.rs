use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use steward_llm::ThreadMessage;
use steward_persist::ThreadRecord;

use crate::{error::ApiResult, state::AppState, tenant::Tenant};

#[derive(Debug, Default, Deserialize)]
pub struct CreateThreadRequest {
    /// Existing handle to resolve; a new thread is opened when absent or unknown
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameThreadRequest {
    /// Explicit name. When absent the thread is titled from its first message.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadResponse {
    pub handle: String,
    pub name: String,
}

impl From<ThreadRecord> for ThreadResponse {
    fn from(record: ThreadRecord) -> Self {
        Self {
            handle: record.handle,
            name: record.display_name,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListThreadsResponse {
    pub threads: Vec<ThreadResponse>,
}

#[derive(Debug, Serialize)]
pub struct ListMessagesResponse {
    pub handle: String,
    pub messages: Vec<ThreadMessage>,
}

pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
) -> ApiResult<Json<ListThreadsResponse>> {
    let mut threads: Vec<ThreadResponse> = state
        .threads()
        .list_all(&tenant)
        .await?
        .into_values()
        .map(ThreadResponse::from)
        .collect();

    // Numeric handles in numeric order, anything else after them
    threads.sort_by_key(|t| (t.handle.parse::<u64>().unwrap_or(u64::MAX), t.handle.clone()));

    Ok(Json(ListThreadsResponse { threads }))
}

pub async fn create_thread(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    body: Option<Json<CreateThreadRequest>>,
) -> ApiResult<(StatusCode, Json<ThreadResponse>)> {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let (_, record) = state
        .threads()
        .resolve_or_create(&tenant, req.handle.as_deref())
        .await?;

    let status = if req.handle.as_deref() == Some(record.handle.as_str()) {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(record.into())))
}

pub async fn rename_thread(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(handle): Path<String>,
    body: Option<Json<RenameThreadRequest>>,
) -> ApiResult<Json<ThreadResponse>> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let threads = state.threads();

    let record = match req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(name) => {
            let mut record = threads.get(&tenant, &handle).await?;
            threads.rename(&tenant, &handle, &name).await?;
            record.display_name = name;
            record
        }
        None => threads.auto_name(&tenant, &handle).await?,
    };

    Ok(Json(record.into()))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(handle): Path<String>,
) -> ApiResult<Json<ListMessagesResponse>> {
    let messages = state.threads().list_messages(&tenant, &handle).await?;
    Ok(Json(ListMessagesResponse { handle, messages }))
}
