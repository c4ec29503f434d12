use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::error_payload;

/// Failed Google API call, rendered for the model as a JSON error payload
#[derive(Debug)]
pub struct ApiFailure {
    pub status: u16,
    pub message: String,
}

impl ApiFailure {
    pub fn into_payload(self) -> String {
        error_payload(self.status, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoogleError {
    Object { message: Option<String> },
    String(String),
}

/// Bearer-token client shared by the calendar and sheet tools
pub struct GoogleApi {
    http: reqwest::Client,
    access_token: String,
    pub(crate) calendar_base: String,
    pub(crate) sheets_base: String,
}

impl GoogleApi {
    pub fn new(access_token: String, calendar_base: String, sheets_base: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_token,
            calendar_base,
            sheets_base,
        }
    }

    pub(crate) fn get(&self, url: String) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub(crate) fn post(&self, url: String) -> RequestBuilder {
        self.http.post(url).bearer_auth(&self.access_token)
    }

    pub(crate) fn put(&self, url: String) -> RequestBuilder {
        self.http.put(url).bearer_auth(&self.access_token)
    }

    pub(crate) fn delete(&self, url: String) -> RequestBuilder {
        self.http.delete(url).bearer_auth(&self.access_token)
    }

    /// Send and decode a JSON body. `204 No Content` decodes as `null`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Value, ApiFailure> {
        let resp = request.send().await.map_err(|e| ApiFailure {
            status: 502,
            message: format!("google request failed: {}", e),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiFailure {
                status: status.as_u16(),
                message: parse_google_error_body(&body).unwrap_or(body),
            });
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let text = resp.text().await.map_err(|e| ApiFailure {
            status: 502,
            message: format!("failed to read google response: {}", e),
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiFailure {
            status: 502,
            message: format!("invalid google response: {}", e),
        })
    }
}

fn parse_google_error_body(body: &str) -> Option<String> {
    let parsed: GoogleErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error? {
        GoogleError::Object { message } => message,
        GoogleError::String(s) => Some(s),
    }
}
