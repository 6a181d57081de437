//! # Error Handling
//!
//! This module defines the error type every HTTP handler returns and how it
//! is converted into a response.
//!
//! ## Key Rust Concepts for Error Handling:
//!
//! ### Result<T, E> Type
//! - **Purpose**: Forces every caller to deal with both success and failure
//! - **No exceptions**: A failing pipeline stage hands back an `Err` value
//!   instead of unwinding through the handler
//!
//! ### Layered error types
//! - Components (cipher, store, services, pipeline) define small `thiserror`
//!   enums that describe *what* went wrong in their own terms
//! - `AppError` is the single boundary type; `From` impls translate component
//!   errors into it so handlers can simply use `?`
//!
//! ### Traits for Error Conversion
//! - **From trait**: Automatic conversion used by the `?` operator
//! - **ResponseError trait**: Turns an `AppError` into an HTTP response
//! - **Display trait**: Human-readable form used in the logs
//!
//! ## Wire contract:
//! Every error becomes `{"error": "<message>"}`. Validation problems answer
//! 400; everything else, including an unknown audio reference, answers 500.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

use crate::pipeline::{PipelineError, Stage};
use crate::storage::StoreError;

/// Application errors as seen by HTTP clients.
///
/// ## Error Categories:
/// - **ValidationError**: Unsupported language code, empty text (400)
/// - **BadRequest**: Malformed form or multipart body (400)
/// - **ExternalServiceError**: A translation/speech provider failed (500)
/// - **IntegrityError**: A stored artifact could not be decrypted (500)
/// - **NotFound**: Unknown or already consumed artifact (500)
/// - **StorageError**: Disk I/O failure on the artifact directory (500)
/// - **ConfigError**: Configuration problems (500)
/// - **Internal**: Anything else (500)
#[derive(Debug)]
pub enum AppError {
    ValidationError(String),

    BadRequest(String),

    /// Carries the pipeline stage so logs show which provider failed
    ExternalServiceError { stage: Stage, message: String },

    IntegrityError(String),

    NotFound(String),

    StorageError(String),

    ConfigError(String),

    Internal(String),
}

impl AppError {
    /// The message placed in the JSON body.
    ///
    /// Validation messages are passed through verbatim because clients match
    /// on them (`"Invalid language code"`).
    pub fn client_message(&self) -> String {
        match self {
            AppError::ValidationError(msg) | AppError::BadRequest(msg) => msg.clone(),
            AppError::ExternalServiceError { stage, message } => {
                format!("{} stage failed: {}", stage, message)
            }
            AppError::IntegrityError(reference) => {
                format!("Audio file {} could not be decrypted", reference)
            }
            AppError::NotFound(reference) => format!("Audio file not found: {}", reference),
            AppError::StorageError(msg) => format!("Audio storage failed: {}", msg),
            AppError::ConfigError(msg) => format!("Configuration error: {}", msg),
            AppError::Internal(msg) => msg.clone(),
        }
    }
}

/// Log-friendly rendering, prefixed with the error category.
impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalServiceError { stage, message } => {
                write!(f, "External service error ({}): {}", stage, message)
            }
            AppError::IntegrityError(msg) => write!(f, "Integrity error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

/// Converts `AppError` into the `{"error": ...}` HTTP response.
///
/// ## Rust Concepts:
/// - **status_code()**: Actix calls this for logging and for the default response
/// - **error_response()**: Builds the body; we reuse `status_code()` so the
///   two can never disagree
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.client_message()
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(reference) => AppError::NotFound(reference),
            StoreError::Integrity(reference) => AppError::IntegrityError(reference),
            StoreError::Storage(io) => AppError::StorageError(io.to_string()),
            StoreError::Seal(e) => AppError::Internal(format!("Could not encrypt audio: {}", e)),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(msg) => AppError::ValidationError(msg),
            PipelineError::ExternalService { stage, message } => {
                AppError::ExternalServiceError { stage, message }
            }
            PipelineError::Store(e) => e.into(),
        }
    }
}

/// Startup code uses anyhow; anything that leaks through is an internal error.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Shorthand for handler return types.
pub type AppResult<T> = Result<T, AppError>;
