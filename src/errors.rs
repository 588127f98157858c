use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Domain-specific error types for the dashboard API.
/// Upstream failures (simulator, market feed) are absorbed into fallbacks
/// and never reach a client. Everything else becomes a 500.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

impl From<serde_json::Error> for DashError {
    fn from(e: serde_json::Error) -> Self {
        DashError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for DashError {
    fn from(e: std::io::Error) -> Self {
        DashError::Io(e.to_string())
    }
}

pub type DashResult<T> = Result<T, DashError>;

/// Handler-level error. Carries the generic message shown to the client
/// while the underlying cause only goes to the log.
#[derive(Debug)]
pub struct ApiError {
    pub message: &'static str,
    pub source: DashError,
}

impl ApiError {
    pub fn new(message: &'static str, source: DashError) -> Self {
        Self { message, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.source, "{}", self.message);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

/// Turns a panicking handler into the same 500 body every other failure uses.
pub fn panic_response(payload: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    ApiError::new("Internal server error", DashError::Runtime(detail)).into_response()
}
