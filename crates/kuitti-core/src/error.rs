//! Error types for the kuitti-core library.

use thiserror::Error;

/// Main error type for the kuitti library.
#[derive(Error, Debug)]
pub enum KuittiError {
    /// Text recognition error. Terminal for the affected document.
    #[error("recognition error: {0}")]
    Recognition(#[from] RecognitionError),

    /// Model service error from the fallback extraction stage.
    #[error("model service error: {0}")]
    Llm(#[from] LlmError),

    /// Error reading the verified ground-truth store or persisted records.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors from the external text recognition engine.
///
/// These are the only per-document fatal errors in the pipeline: without
/// recognized text no later stage can run.
#[derive(Error, Debug)]
pub enum RecognitionError {
    /// Input file type the adapter cannot hand to the engine.
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Failed to render the document into engine-readable pages.
    #[error("failed to render document: {0}")]
    Render(String),

    /// The recognition engine itself failed.
    #[error("recognition engine failed: {0}")]
    Engine(String),

    /// The engine ran but produced no usable text.
    #[error("document produced no text")]
    EmptyText,

    /// I/O error while reading the document or engine output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the model service collaborator.
///
/// The two variants are deliberately distinct: an unreachable service and a
/// reply that answered but could not be parsed are different failure kinds,
/// even though both degrade to a zero-field extraction step.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The service endpoint could not be reached or returned an error status.
    #[error("model service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service replied but the reply contained no parseable data.
    #[error("model reply could not be parsed: {0}")]
    ParseFailure(String),
}

/// Errors reading persisted records or the verified store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to read a record file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// A record file exists but does not parse.
    #[error("malformed record {path}: {source}")]
    Malformed {
        path: String,
        source: serde_json::Error,
    },

    /// Failed to write a record file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for the kuitti library.
pub type Result<T> = std::result::Result<T, KuittiError>;
