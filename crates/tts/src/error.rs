use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TtsError>;

/// Errors raised while loading models, running synthesis, or reading requests
#[derive(Debug, Error)]
pub enum TtsError {
    /// Input was empty after trimming
    #[error("No text provided")]
    EmptyText,

    /// A model file could not be located or downloaded
    #[error("failed to fetch '{file}' from {source_name}: {message}")]
    Artifact {
        source_name: String,
        file: String,
        message: String,
    },

    /// ONNX Runtime rejected a session or a run
    #[error("ONNX Runtime error: {0}")]
    Runtime(String),

    /// Tokenizer could not be loaded or failed on the input
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// A model returned tensors of an unexpected name, type, or shape
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    /// Speaker embedding table is malformed or the index is out of range
    #[error("Speaker embedding error: {0}")]
    SpeakerEmbedding(String),

    /// Waveform could not be written as WAV
    #[error("Audio encoding failed: {0}")]
    Encoding(String),

    /// Model configuration is inconsistent
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Neither model family could be loaded
    #[error("No speech model could be loaded (primary: {primary}; fallback: {fallback})")]
    ModelUnavailable { primary: String, fallback: String },

    /// Request body did not declare a JSON content type
    #[error("Unsupported Content-Type, expected: 'Content-Type: application/json'")]
    UnsupportedMediaType,

    /// Request body exceeded the size limit
    #[error("Request body is too large, limit is {0} bytes")]
    PayloadTooLarge(usize),

    /// Request body could not be read or parsed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TtsError {
    /// HTTP status used when the error rejects a request before synthesis
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse { error: self.to_string() };

        (status, Json(body)).into_response()
    }
}

/// Attach a short description to ONNX Runtime failures
pub(crate) trait RuntimeContext<T> {
    fn runtime(self, what: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> RuntimeContext<T> for std::result::Result<T, E> {
    fn runtime(self, what: &str) -> Result<T> {
        self.map_err(|e| TtsError::Runtime(format!("{what}: {e}")))
    }
}
