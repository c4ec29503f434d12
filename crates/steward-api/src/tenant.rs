use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

/// Header naming the caller whose threads and nodes a request touches
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Caller identity taken from [`TENANT_HEADER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(TENANT_HEADER)
            .ok_or_else(|| ApiError::BadRequest(format!("missing {} header", TENANT_HEADER)))?;

        let tenant = value
            .to_str()
            .map_err(|_| ApiError::BadRequest(format!("invalid {} header", TENANT_HEADER)))?
            .trim();

        if tenant.is_empty() {
            return Err(ApiError::BadRequest(format!("empty {} header", TENANT_HEADER)));
        }

        Ok(Tenant(tenant.to_string()))
    }
}
