//! # External Speech and Language Services
//!
//! The pipeline talks to four third-party services through the traits below.
//! Each trait has exactly one production implementation backed by `reqwest`;
//! tests substitute the in-memory doubles from `mock`.
//!
//! ## Providers:
//! - **Translator**: Google translate (`translate_a/single`, `gtx` client)
//! - **SpeechSynthesizer**: Google translate text-to-speech (MP3 output)
//! - **TranscriptEnhancer**: OpenAI chat completions
//! - **SpeechRecognizer**: OpenAI Whisper transcriptions
//!
//! Every call is a single attempt. Failures come back as [`ServiceError`]
//! and the pipeline decides whether they are fatal.

pub mod google_translate;
pub mod google_tts;
pub mod openai;

#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use std::time::Duration;

use crate::language::LanguageCode;

pub use google_translate::GoogleTranslator;
pub use google_tts::GoogleSpeechSynthesizer;
pub use openai::{OpenAiEnhancer, OpenAiSpeechRecognizer};

/// Browser-like agent; the Google endpoints reject requests without one.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Returns MP3 bytes.
    async fn synthesize(&self, text: &str, language: LanguageCode) -> Result<Vec<u8>, ServiceError>;
}

#[async_trait]
pub trait TranscriptEnhancer: Send + Sync {
    async fn enhance(&self, text: &str) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        language: LanguageCode,
    ) -> Result<String, ServiceError>;
}

/// Shared HTTP client with the configured per-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Turn a non-success response into [`ServiceError::Status`], keeping a
/// bounded slice of the body for the logs.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}
