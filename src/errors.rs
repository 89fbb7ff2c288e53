use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-specific error types.
///
/// Every failure of an analysis round-trip ends up as one of these and is
/// surfaced to the caller as a single message.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Text is not well-formed JSON.
    MalformedJson(String),
    /// A required top-level key is absent (or null).
    MissingRequiredField(String),
    /// A present field has the wrong type, or an out-of-vocabulary / out-of-range value.
    InvalidField(String),
    /// The inference endpoint returned no text.
    EmptyResponse,
    /// No API key is configured for the inference endpoint.
    CredentialMissing,
    /// Network or endpoint failure while calling the inference service.
    TransportError(String),
    /// An analysis is already in flight for this session.
    AnalysisInProgress,
    /// Resource not found (e.g. dashboard requested before any analysis).
    NotFound(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Short machine-readable tag for the error kind.
    ///
    /// Context wrappers report the kind of the error they wrap.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::MalformedJson(_) => "malformed_json",
            AppError::MissingRequiredField(_) => "missing_required_field",
            AppError::InvalidField(_) => "invalid_field",
            AppError::EmptyResponse => "empty_response",
            AppError::CredentialMissing => "credential_missing",
            AppError::TransportError(_) => "transport_error",
            AppError::AnalysisInProgress => "analysis_in_progress",
            AppError::NotFound(_) => "not_found",
            AppError::InternalError(_) => "internal_error",
            AppError::WithContext { source, .. } => source.kind(),
        }
    }

    /// Strips any context wrappers and returns the underlying error.
    pub fn root(&self) -> &AppError {
        match self {
            AppError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedJson(_) => StatusCode::BAD_REQUEST,
            AppError::MissingRequiredField(_) | AppError::InvalidField(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::EmptyResponse | AppError::TransportError(_) => StatusCode::BAD_GATEWAY,
            AppError::CredentialMissing => StatusCode::SERVICE_UNAVAILABLE,
            AppError::AnalysisInProgress => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::WithContext { source, .. } => source.status(),
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::MalformedJson(msg) => write!(f, "Malformed JSON: {}", msg),
            AppError::MissingRequiredField(name) => {
                write!(f, "Missing required field '{}'", name)
            }
            AppError::InvalidField(msg) => write!(f, "Invalid field: {}", msg),
            AppError::EmptyResponse => write!(f, "No response text received from the model"),
            AppError::CredentialMissing => write!(
                f,
                "API key is missing. Set API_KEY in the environment and restart the service"
            ),
            AppError::TransportError(msg) => write!(f, "Inference request failed: {}", msg),
            AppError::AnalysisInProgress => write!(f, "An analysis is already in progress"),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Logs errors appropriately based on their severity.
    fn into_response(self) -> Response {
        let status = self.status();
        match self.root() {
            AppError::TransportError(_) | AppError::EmptyResponse => {
                tracing::error!("Inference failure: {}", self);
            }
            AppError::InternalError(_) => {
                tracing::error!("Internal error: {}", self);
            }
            AppError::CredentialMissing => {
                tracing::warn!("Analyze rejected: credential missing");
            }
            _ => {
                tracing::debug!("Request rejected: {}", self);
            }
        }

        let body = Json(json!({
            "error": self.to_string(),
            "kind": self.kind(),
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    /// Syntax and EOF errors mean the text was never JSON; anything else is a shape mismatch.
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match err.classify() {
            Category::Syntax | Category::Eof => AppError::MalformedJson(err.to_string()),
            Category::Data => AppError::InvalidField(err.to_string()),
            Category::Io => AppError::InternalError(err.to_string()),
        }
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }
}
