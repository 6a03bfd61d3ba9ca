//! API and gate error types.

use axum::extract::rejection::JsonRejection;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use exitlinks_core::LinkError;

use crate::pages::ErrorPage;

/// JSON API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The configured site cannot serve requests.
    #[error("site misconfigured: {0}")]
    Misconfigured(#[from] LinkError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Misconfigured(_) => (StatusCode::INTERNAL_SERVER_ERROR, "misconfigured"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// A gate request that is answered with an HTML error page.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct GateError {
    #[source]
    pub source: LinkError,
    pub site_name: String,
    pub home_url: String,
}

impl GateError {
    /// Message shown to the user. Never includes the rejected input.
    pub fn message(&self) -> &'static str {
        match self.source {
            LinkError::MissingDestination => "No URL provided.",
            _ => "Invalid URL provided.",
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let html = ErrorPage {
            message: self.message(),
            site_name: &self.site_name,
            home_url: &self.home_url,
        }
        .render();

        (
            StatusCode::BAD_REQUEST,
            [
                (header::CACHE_CONTROL, "no-store"),
                (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
            ],
            Html(html),
        )
            .into_response()
    }
}
