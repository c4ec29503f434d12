use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;

use steward_graph::ExchangeRequest;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    tenant::Tenant,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Conversation to continue; a new one is opened when absent or unknown
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

fn sse_event(name: &str, payload: Value) -> Event {
    Event::default().event(name).data(payload.to_string())
}

/// Run one exchange and stream the reply using Server-Sent Events
///
/// Events, in order: `thread` (handle and name), any number of `message`
/// fragments, then exactly one of `done` or `error`.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Json(req): Json<ChatRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let mut request = ExchangeRequest::new(tenant, req.message);
    if let Some(handle) = req.handle {
        request = request.with_handle(handle);
    }
    if let Some(instructions) = req.instructions {
        request = request.with_instructions(instructions);
    }

    // Thread and message failures surface as a plain error response
    let mut exchange = state.runner.run_exchange(request).await?;

    let thread_event = sse_event(
        "thread",
        json!({
            "handle": exchange.handle(),
            "name": exchange.thread().display_name,
        }),
    );
    let handle = exchange.handle().to_string();

    let events = async_stream::stream! {
        yield Ok::<_, Infallible>(thread_event);

        let mut failed = false;
        while let Some(item) = exchange.next().await {
            match item {
                Ok(content) => yield Ok(sse_event("message", json!({ "content": content }))),
                Err(e) => {
                    failed = true;
                    yield Ok(sse_event("error", json!({ "error": e.to_string() })));
                    break;
                }
            }
        }

        if !failed {
            yield Ok(sse_event("done", json!({ "status": "completed", "handle": handle })));
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
