use async_trait::async_trait;
use serde_json::Value;

use super::{ensure_success, ServiceError, Translator};
use crate::language::LanguageCode;

/// Translator backed by the public Google translate endpoint.
///
/// The endpoint answers with nested arrays; the first element holds one
/// `[translated, original, ...]` entry per sentence.
pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslator {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[tracing::instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn translate(
        &self,
        text: &str,
        source: LanguageCode,
        target: LanguageCode,
    ) -> Result<String, ServiceError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", source.google_code()),
                ("tl", target.google_code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let body: Value = ensure_success(response).await?.json().await?;
        parse_translation(&body)
    }
}

fn parse_translation(body: &Value) -> Result<String, ServiceError> {
    let sentences = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ServiceError::InvalidResponse("missing sentence list".to_string()))?;

    let translated: String = sentences
        .iter()
        .filter_map(|sentence| sentence.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(ServiceError::InvalidResponse("empty translation".to_string()));
    }
    Ok(translated)
}
