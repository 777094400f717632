//! Caller context extracted from identity headers.
//!
//! The identity provider in front of this service authenticates the user and
//! forwards who they are, which seller they act for and which FBR environment
//! that seller is set up for. The service trusts these headers and never reads
//! the environment from the request body.

use crate::models::Environment;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const SELLER_ID_HEADER: &str = "X-Seller-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";
pub const ENVIRONMENT_HEADER: &str = "X-FBR-Environment";

#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user_id: String,
    pub seller_id: Uuid,
    pub role: Option<String>,
    pub environment: Environment,
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn required<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    header(parts, name).ok_or_else(|| {
        AppError::AuthError(anyhow::anyhow!(
            "Missing {} header (required from identity provider)",
            name
        ))
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = required(parts, USER_ID_HEADER)?;

        let seller_id = required(parts, SELLER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| {
                AppError::AuthError(anyhow::anyhow!("Invalid {} header", SELLER_ID_HEADER))
            })?;

        let environment = required(parts, ENVIRONMENT_HEADER)?
            .parse::<Environment>()
            .map_err(|e| AppError::AuthError(anyhow::anyhow!(e)))?;

        let role = header(parts, USER_ROLE_HEADER).map(str::to_string);

        Ok(CallerContext {
            user_id: user_id.to_string(),
            seller_id,
            role,
            environment,
        })
    }
}
