use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::enhancement::{EnhancementOutcome, SkipReason};
use super::stage::Stage;
use super::{PipelineError, INVALID_LANGUAGE_MESSAGE, UNCLEAR_AUDIO_MESSAGE};
use crate::language::LanguageCode;
use crate::services::{SpeechRecognizer, SpeechSynthesizer, TranscriptEnhancer, Translator};
use crate::storage::{ArtifactRef, ArtifactStore};

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    pub source: LanguageCode,
    pub target: LanguageCode,
    pub enhance: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    /// The text that was translated: the enhanced transcript when enhancement
    /// succeeded, the submitted one otherwise
    pub original_text: String,
    pub translated_text: String,
    pub audio_file: ArtifactRef,
    #[serde(skip)]
    pub enhancement: EnhancementOutcome,
}

/// Validate a pair of raw language codes.
///
/// Runs before any pipeline stage so an unsupported code never reaches the
/// network.
pub fn parse_language_pair(
    input: &str,
    output: &str,
) -> Result<(LanguageCode, LanguageCode), PipelineError> {
    let invalid = |_| PipelineError::Validation(INVALID_LANGUAGE_MESSAGE.to_string());
    let source = input.parse::<LanguageCode>().map_err(invalid)?;
    let target = output.parse::<LanguageCode>().map_err(invalid)?;
    Ok((source, target))
}

/// Sequential orchestration of the external services and the artifact store.
///
/// Holds only shared, read-only handles, so a single instance serves every
/// request concurrently.
pub struct TranslationPipeline {
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    enhancer: Option<Arc<dyn TranscriptEnhancer>>,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    store: Arc<ArtifactStore>,
    max_text_chars: usize,
}

impl TranslationPipeline {
    pub fn new(
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        store: Arc<ArtifactStore>,
        max_text_chars: usize,
    ) -> Self {
        Self {
            translator,
            synthesizer,
            enhancer: None,
            recognizer: None,
            store,
            max_text_chars,
        }
    }

    pub fn with_enhancer(mut self, enhancer: Arc<dyn TranscriptEnhancer>) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn has_enhancer(&self) -> bool {
        self.enhancer.is_some()
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    #[tracing::instrument(
        skip(self, request),
        fields(source = %request.source, target = %request.target)
    )]
    pub async fn translate_and_speak(
        &self,
        request: TranslationRequest,
    ) -> Result<TranslationOutcome, PipelineError> {
        let text = self.validate_text(&request.text)?;
        debug!(stage = %Stage::Received, chars = text.chars().count(), "Translation requested");

        let enhancement = if request.enhance {
            self.enhance(text).await
        } else {
            EnhancementOutcome::Skipped(SkipReason::NotRequested)
        };
        let source_text = enhancement.resolve(text);

        debug!(stage = %Stage::Translating, "Calling translator");
        let translated_text = self
            .translator
            .translate(&source_text, request.source, request.target)
            .await
            .map_err(|e| PipelineError::external(Stage::Translating, e))?;

        debug!(stage = %Stage::Synthesizing, "Calling speech synthesizer");
        let audio = self
            .synthesizer
            .synthesize(&translated_text, request.target)
            .await
            .map_err(|e| PipelineError::external(Stage::Synthesizing, e))?;

        debug!(stage = %Stage::Encrypting, audio_bytes = audio.len(), "Sealing artifact");
        let audio_file = self.store.store(&audio).await?;

        info!(
            stage = %Stage::Stored,
            artifact = %audio_file,
            enhancement = enhancement.label(),
            "Translation complete"
        );

        Ok(TranslationOutcome {
            original_text: source_text,
            translated_text,
            audio_file,
            enhancement,
        })
    }

    /// Best-effort enhancement. Never fails; the outcome says what happened.
    pub async fn enhance(&self, text: &str) -> EnhancementOutcome {
        let Some(enhancer) = &self.enhancer else {
            debug!(stage = %Stage::Enhancing, "No enhancer configured, skipping");
            return EnhancementOutcome::Skipped(SkipReason::NotConfigured);
        };

        debug!(stage = %Stage::Enhancing, "Calling transcript enhancer");
        match enhancer.enhance(text).await {
            Ok(enhanced) => EnhancementOutcome::Enhanced(enhanced),
            Err(e) => {
                warn!(
                    stage = %Stage::Enhancing,
                    error = %e,
                    "Enhancement failed, continuing with original text"
                );
                EnhancementOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Recognize speech in an uploaded recording.
    #[tracing::instrument(skip(self, audio, language), fields(audio_bytes = audio.len(), language = %language))]
    pub async fn transcribe(
        &self,
        audio: Vec<u8>,
        filename: &str,
        language: LanguageCode,
    ) -> Result<String, PipelineError> {
        let recognizer = self.recognizer.as_ref().ok_or_else(|| PipelineError::ExternalService {
            stage: Stage::Transcribing,
            message: "no speech recognizer is configured".to_string(),
        })?;

        let text = recognizer
            .transcribe(audio, filename, language)
            .await
            .map_err(|e| PipelineError::external(Stage::Transcribing, e))?;

        if text.trim().is_empty() {
            return Err(PipelineError::Validation(UNCLEAR_AUDIO_MESSAGE.to_string()));
        }
        debug!(stage = %Stage::Transcribing, chars = text.chars().count(), "Speech recognized");
        Ok(text)
    }

    /// Blank text is rejected; accepted text is forwarded exactly as received.
    fn validate_text<'a>(&self, text: &'a str) -> Result<&'a str, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::Validation("Text must not be empty".to_string()));
        }
        if text.chars().count() > self.max_text_chars {
            return Err(PipelineError::Validation(format!(
                "Text exceeds the limit of {} characters",
                self.max_text_chars
            )));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{MockEnhancer, MockRecognizer, MockSynthesizer, MockTranslator, FAKE_MP3};
    use crate::storage::StoreError;
    use crate::testing::TestHarness;

    fn request(text: &str, enhance: bool) -> TranslationRequest {
        TranslationRequest {
            text: text.to_string(),
            source: LanguageCode::En,
            target: LanguageCode::Es,
            enhance,
        }
    }

    #[test]
    fn test_parse_language_pair() {
        assert_eq!(
            parse_language_pair("en", "es").unwrap(),
            (LanguageCode::En, LanguageCode::Es)
        );
        for (input, output) in [("xx", "es"), ("en", "xx"), ("", "")] {
            match parse_language_pair(input, output) {
                Err(PipelineError::Validation(msg)) => assert_eq!(msg, INVALID_LANGUAGE_MESSAGE),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_end_to_end_translation() {
        let harness = TestHarness::new().await;

        let outcome = harness
            .pipeline
            .translate_and_speak(request("Hello, how are you?", false))
            .await
            .unwrap();

        assert_eq!(outcome.original_text, "Hello, how are you?");
        assert_eq!(outcome.translated_text, "Hola, ¿cómo estás?");
        assert_eq!(
            outcome.enhancement,
            EnhancementOutcome::Skipped(SkipReason::NotRequested)
        );

        let audio = harness.store.retrieve(&outcome.audio_file).await.unwrap();
        assert_eq!(audio, FAKE_MP3);
        assert!(matches!(
            harness.store.retrieve(&outcome.audio_file).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_enhanced_text_is_translated() {
        let harness = TestHarness::new().await;
        let enhancer = Arc::new(MockEnhancer::default());
        let pipeline = harness.pipeline_with(Some(enhancer.clone()), None);

        let outcome = pipeline
            .translate_and_speak(request("pt has fever", true))
            .await
            .unwrap();

        assert_eq!(enhancer.call_count(), 1);
        assert_eq!(outcome.original_text, "pt has fever (reviewed)");
        assert_eq!(
            harness.translator.last_text().as_deref(),
            Some("pt has fever (reviewed)")
        );
    }

    #[tokio::test]
    async fn test_enhancement_failure_falls_back_to_original() {
        let harness = TestHarness::new().await;
        let enhancer = Arc::new(MockEnhancer::failing());
        let pipeline = harness.pipeline_with(Some(enhancer.clone()), None);

        let outcome = pipeline
            .translate_and_speak(request("pt has fever", true))
            .await
            .unwrap();

        assert_eq!(enhancer.call_count(), 1);
        assert_eq!(harness.translator.last_text().as_deref(), Some("pt has fever"));
        assert_eq!(outcome.original_text, "pt has fever");
        assert!(matches!(outcome.enhancement, EnhancementOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_surrounding_whitespace_is_forwarded() {
        let harness = TestHarness::new().await;

        let outcome = harness
            .pipeline
            .translate_and_speak(request("  pt has fever \n", false))
            .await
            .unwrap();

        assert_eq!(
            harness.translator.last_text().as_deref(),
            Some("  pt has fever \n")
        );
        assert_eq!(outcome.original_text, "  pt has fever \n");
    }

    #[tokio::test]
    async fn test_enhancement_not_requested_skips_enhancer() {
        let harness = TestHarness::new().await;
        let enhancer = Arc::new(MockEnhancer::default());
        let pipeline = harness.pipeline_with(Some(enhancer.clone()), None);

        pipeline
            .translate_and_speak(request("hello", false))
            .await
            .unwrap();
        assert_eq!(enhancer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_translation_failure_aborts_before_synthesis() {
        let harness = TestHarness::with_services(
            MockTranslator::failing(),
            MockSynthesizer::default(),
        )
        .await;

        let err = harness
            .pipeline
            .translate_and_speak(request("hello", false))
            .await
            .unwrap_err();

        match err {
            PipelineError::ExternalService { stage, message } => {
                assert_eq!(stage, Stage::Translating);
                assert!(message.contains("429"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(harness.synthesizer.call_count(), 0);
        assert_eq!(harness.store.live_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_stores_nothing() {
        let harness = TestHarness::with_services(
            MockTranslator::default(),
            MockSynthesizer::failing(),
        )
        .await;

        let err = harness
            .pipeline
            .translate_and_speak(request("hello", false))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::ExternalService { stage: Stage::Synthesizing, .. }
        ));
        assert_eq!(harness.store.live_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized_text() {
        let harness = TestHarness::new().await;

        let oversized = "a".repeat(harness.config.limits.max_text_chars + 1);
        for text in ["", "   ", oversized.as_str()] {
            let err = harness
                .pipeline
                .translate_and_speak(request(text, false))
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::Validation(_)));
        }
        assert_eq!(harness.translator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_transcribe_requires_recognizer() {
        let harness = TestHarness::new().await;
        let err = harness
            .pipeline
            .transcribe(vec![1, 2, 3], "clip.wav", LanguageCode::En)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExternalService { stage: Stage::Transcribing, .. }
        ));
    }

    #[tokio::test]
    async fn test_transcribe_reports_unclear_audio() {
        let harness = TestHarness::new().await;
        let recognizer = Arc::new(MockRecognizer::hearing("  "));
        let pipeline = harness.pipeline_with(None, Some(recognizer.clone()));

        match pipeline.transcribe(vec![0; 16], "clip.wav", LanguageCode::En).await {
            Err(PipelineError::Validation(msg)) => assert_eq!(msg, UNCLEAR_AUDIO_MESSAGE),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(recognizer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_transcribe_returns_text() {
        let harness = TestHarness::new().await;
        let recognizer = Arc::new(MockRecognizer::hearing("I have a headache"));
        let pipeline = harness.pipeline_with(None, Some(recognizer));

        let text = pipeline
            .transcribe(vec![0; 16], "clip.wav", LanguageCode::En)
            .await
            .unwrap();
        assert_eq!(text, "I have a headache");
    }
}
