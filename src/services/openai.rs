//! OpenAI-backed transcript enhancement and speech recognition.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::{ensure_success, ServiceError, SpeechRecognizer, TranscriptEnhancer};
use crate::config::OpenAiConfig;
use crate::language::LanguageCode;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Asks a chat model to clean up a medical transcript.
pub struct OpenAiEnhancer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    prompt: String,
    max_tokens: u32,
}

impl OpenAiEnhancer {
    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.enhancement_model.clone(),
            prompt: config.enhancement_prompt.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl TranscriptEnhancer for OpenAiEnhancer {
    #[tracing::instrument(skip(self, text), fields(model = %self.model))]
    async fn enhance(&self, text: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: format!("{} {}", self.prompt, text),
            }],
            max_tokens: self.max_tokens,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let reply: ChatResponse = ensure_success(response).await?.json().await?;
        extract_reply(reply)
    }
}

fn extract_reply(reply: ChatResponse) -> Result<String, ServiceError> {
    let text = reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ServiceError::InvalidResponse("empty completion".to_string()));
    }
    Ok(text)
}

/// Whisper transcription of an uploaded recording.
pub struct OpenAiSpeechRecognizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiSpeechRecognizer {
    pub fn new(client: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.transcription_model.clone(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for OpenAiSpeechRecognizer {
    #[tracing::instrument(skip(self, audio), fields(audio_bytes = audio.len(), model = %self.model))]
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        language: LanguageCode,
    ) -> Result<String, ServiceError> {
        let file = Part::bytes(audio)
            .file_name(filename.to_string())
            .mime_str("application/octet-stream")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", language.code().to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let transcription: TranscriptionResponse = ensure_success(response).await?.json().await?;
        Ok(transcription.text.trim().to_string())
    }
}
