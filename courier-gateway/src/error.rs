//! Structured gateway error, the `{id, code, detail}` envelope every
//! provider surfaces at its HTTP boundary.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error exchanged between the gateway and its providers.
///
/// `id` is a stable machine-readable identifier, `code` an HTTP-like status.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{id}: {detail} ({code})")]
pub struct GatewayError {
    pub id:     String,
    pub code:   u16,
    pub detail: String,
}

pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn new(id: impl Into<String>, code: u16, detail: impl Into<String>) -> Self {
        Self { id: id.into(), code, detail: detail.into() }
    }

    pub fn bad_request(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 400, detail)
    }

    pub fn unauthorized(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 401, detail)
    }

    pub fn forbidden(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 403, detail)
    }

    pub fn not_found(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 404, detail)
    }

    pub fn method_not_allowed(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 405, detail)
    }

    pub fn internal(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 500, detail)
    }

    pub fn bad_gateway(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(id, 502, detail)
    }

    /// HTTP status for this error; unknown codes collapse to 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
