use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use steward_persist::{Datanode, NodePayload};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    tenant::Tenant,
};

/// Wire name of the node type field
const NODE_TYPE_KEY: &str = "modalContentComponent";

#[derive(Debug, Deserialize)]
pub struct PruneRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedNodeResponse {
    pub node_id: String,
    pub parent_id: String,
}

/// The tenant's whole tree. A tenant without one gets an empty root.
pub async fn get_tree(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
) -> ApiResult<Json<Datanode>> {
    Ok(Json(state.nodes.load_or_init(&tenant).await?))
}

pub async fn put_tree(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Json(tree): Json<Datanode>,
) -> ApiResult<StatusCode> {
    state.nodes.save_tree(&tenant, &tree).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn prune_tree(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Json(req): Json<PruneRequest>,
) -> ApiResult<Json<Datanode>> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }
    Ok(Json(state.nodes.prune(&tenant, &req.prompt).await?))
}

pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(node_id): Path<String>,
) -> ApiResult<Json<Datanode>> {
    Ok(Json(state.nodes.find_node(&tenant, &node_id).await?))
}

/// Merge top-level fields into a node
pub async fn update_node(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(node_id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> ApiResult<Json<Datanode>> {
    Ok(Json(state.nodes.update_node(&tenant, &node_id, fields).await?))
}

pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(node_id): Path<String>,
) -> ApiResult<Json<Datanode>> {
    Ok(Json(state.nodes.remove_node(&tenant, &node_id).await?))
}

pub async fn insert_child(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(parent_id): Path<String>,
    Json(mut body): Json<Value>,
) -> ApiResult<(StatusCode, Json<CreatedNodeResponse>)> {
    let node_type = match body.as_object_mut().and_then(|m| m.remove(NODE_TYPE_KEY)) {
        None | Some(Value::Null) => None,
        Some(Value::String(t)) => Some(t),
        Some(_) => {
            return Err(ApiError::BadRequest(format!("{} must be a string", NODE_TYPE_KEY)))
        }
    };
    let payload = NodePayload::from_value(body)?;

    let node_id = state
        .nodes
        .insert_child(&tenant, &parent_id, payload, node_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedNodeResponse { node_id, parent_id }),
    ))
}

/// Replace name, description, value and details of a node in place
pub async fn replace_contents(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Path(node_id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Datanode>> {
    let payload = NodePayload::from_value(body)?;
    state.nodes.replace_contents(&tenant, &node_id, payload).await?;
    Ok(Json(state.nodes.find_node(&tenant, &node_id).await?))
}
