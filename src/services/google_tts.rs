use async_trait::async_trait;

use super::{ensure_success, ServiceError, SpeechSynthesizer};
use crate::language::LanguageCode;

/// The speech endpoint refuses longer inputs.
pub const MAX_CHUNK_CHARS: usize = 100;

/// Synthesizer backed by the Google translate text-to-speech endpoint.
///
/// Long text is split into chunks of at most [`MAX_CHUNK_CHARS`] characters,
/// synthesized one by one and concatenated. MP3 frames are self-delimiting,
/// so the concatenation plays back as a single file.
pub struct GoogleSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleSpeechSynthesizer {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleSpeechSynthesizer {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn synthesize(&self, text: &str, language: LanguageCode) -> Result<Vec<u8>, ServiceError> {
        let chunks = split_for_speech(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(ServiceError::InvalidResponse("no text to speak".to_string()));
        }

        let total = chunks.len().to_string();
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", language.google_code()),
                    ("q", chunk.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()
                .await?;

            let bytes = ensure_success(response).await?.bytes().await?;
            audio.extend_from_slice(&bytes);
        }

        if audio.is_empty() {
            return Err(ServiceError::InvalidResponse("empty audio".to_string()));
        }
        tracing::debug!(chunks = chunks.len(), audio_bytes = audio.len(), "Speech synthesized");
        Ok(audio)
    }
}

/// Pack words greedily into chunks of at most `max_chars` characters.
///
/// Words longer than the limit (including unspaced scripts such as Chinese
/// or Japanese) are cut on character boundaries.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
