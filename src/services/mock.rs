//! In-memory service doubles that count how often they are called.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{ServiceError, SpeechRecognizer, SpeechSynthesizer, TranscriptEnhancer, Translator};
use crate::language::LanguageCode;

pub const FAKE_MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00\xff\xfb\x90\x64 mock frames";

#[derive(Default)]
pub struct MockTranslator {
    pub calls: AtomicUsize,
    pub last_text: Mutex<Option<String>>,
    pub fail: bool,
}

impl MockTranslator {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(text.to_string());
        if self.fail {
            return Err(ServiceError::Status {
                status: 429,
                body: "Too Many Requests".to_string(),
            });
        }
        match (text, source, target) {
            ("Hello, how are you?", LanguageCode::En, LanguageCode::Es) => {
                Ok("Hola, ¿cómo estás?".to_string())
            }
            _ => Ok(format!("[{}] {}", target, text)),
        }
    }
}

#[derive(Default)]
pub struct MockSynthesizer {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockSynthesizer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str, _language: LanguageCode) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Timeout);
        }
        Ok(FAKE_MP3.to_vec())
    }
}

#[derive(Default)]
pub struct MockEnhancer {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl MockEnhancer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptEnhancer for MockEnhancer {
    async fn enhance(&self, text: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Transport("connection refused".to_string()));
        }
        Ok(format!("{} (reviewed)", text))
    }
}

#[derive(Default)]
pub struct MockRecognizer {
    pub calls: AtomicUsize,
    pub transcript: String,
}

impl MockRecognizer {
    pub fn hearing(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(
        &self,
        _audio: Vec<u8>,
        _filename: &str,
        _language: LanguageCode,
    ) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.transcript.clone())
    }
}
