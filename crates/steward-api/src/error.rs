use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use steward_graph::ExchangeError;
use steward_persist::PersistError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ThreadNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Persist(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            ApiError::Persist(PersistError::InvalidNode(_) | PersistError::RootRemoval) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Exchange(ExchangeError::ThreadNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Exchange(ExchangeError::Persist(e)) if e.is_not_found() => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            match self {
                ApiError::Persist(_) => "Storage error".to_string(),
                ApiError::Exchange(_) => "Processing error".to_string(),
                ApiError::Config(_) => "Configuration error".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::Persist(PersistError::NodeNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Persist(PersistError::RootRemoval).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Exchange(ExchangeError::ThreadNotFound("9".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Exchange(ExchangeError::Timeout(5)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadRequest("Test error".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
