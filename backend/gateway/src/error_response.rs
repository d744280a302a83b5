//! JSON error envelope for every non-2xx response.
//!
//! Handlers, the 404 fallback, the 405 rewrite, and the panic guard all answer
//! with `{"type": ..., "error": ...}`.

use std::any::Any;

use anyhow::anyhow;
use axum::{
    Json,
    extract::Request,
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use formlens_core::{AnalysisError, OcrError};
use logging::redact_sensitive_data;

/// Axum-facing wrapper so [`AnalysisError`] can be returned from handlers.
#[derive(Debug)]
pub struct ApiError(pub AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self(err)
    }
}

impl From<OcrError> for ApiError {
    fn from(err: OcrError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.body())).into_response()
    }
}

/// Logs a failed request inside the handler's span and wraps it for the response.
pub fn report(err: AnalysisError) -> ApiError {
    let detail = redact_sensitive_data(&format!("{err:#}"));
    if err.status_code() >= 500 {
        error!(kind = err.kind().label(), error = %detail, "Request failed");
    } else {
        warn!(kind = err.kind().label(), error = %detail, "Request rejected");
    }
    ApiError(err)
}

/// Router fallback.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError(AnalysisError::NotFound {
        path: uri.path().to_string(),
    })
}

/// Replaces axum's empty 405 with the JSON envelope.
pub async fn method_not_allowed(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return ApiError(AnalysisError::MethodNotAllowed { method, path }).into_response();
    }
    response
}

/// Panic guard for `CatchPanicLayer`.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    error!(panic = %detail, "Handler panicked");
    ApiError(AnalysisError::Internal(anyhow!("handler panicked"))).into_response()
}
