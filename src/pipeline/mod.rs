//! # Translation Pipeline
//!
//! Turns a transcript into stored, encrypted, translated speech:
//!
//! ```text
//! RECEIVED → (ENHANCING) → TRANSLATING → SYNTHESIZING → ENCRYPTING → STORED
//! ```
//!
//! ## Failure policy:
//! - **ENHANCING** is best-effort: a failure is logged and the original text
//!   carries on to translation.
//! - Every other stage is fatal: the first error aborts the run and is
//!   reported with the stage it happened in. Nothing is retried or cached.

pub mod enhancement;
pub mod stage;
pub mod translation;

use crate::services::ServiceError;
use crate::storage::StoreError;

pub use enhancement::{EnhancementOutcome, SkipReason};
pub use stage::Stage;
pub use translation::{
    parse_language_pair, TranslationOutcome, TranslationPipeline, TranslationRequest,
};

pub const INVALID_LANGUAGE_MESSAGE: &str = "Invalid language code";
pub const UNCLEAR_AUDIO_MESSAGE: &str = "Sorry, the audio was not clear enough to recognize.";

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0}")]
    Validation(String),
    #[error("{stage} stage failed: {message}")]
    ExternalService { stage: Stage, message: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PipelineError {
    pub(crate) fn external(stage: Stage, err: ServiceError) -> Self {
        PipelineError::ExternalService {
            stage,
            message: err.to_string(),
        }
    }
}
