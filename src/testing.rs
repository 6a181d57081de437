//! Shared fixtures for unit and handler tests.

use std::sync::Arc;

use tempfile::TempDir;

use crate::config::AppConfig;
use crate::pipeline::TranslationPipeline;
use crate::security::Cipher;
use crate::services::mock::{MockEnhancer, MockRecognizer, MockSynthesizer, MockTranslator};
use crate::state::AppState;
use crate::storage::ArtifactStore;

/// A pipeline wired to mock services and a throwaway artifact directory.
pub struct TestHarness {
    pub dir: TempDir,
    pub config: AppConfig,
    pub store: Arc<ArtifactStore>,
    pub translator: Arc<MockTranslator>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub pipeline: Arc<TranslationPipeline>,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_services(MockTranslator::default(), MockSynthesizer::default()).await
    }

    pub async fn with_services(translator: MockTranslator, synthesizer: MockSynthesizer) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let mut config = AppConfig::default();
        config.storage.artifact_dir = dir.path().to_string_lossy().into_owned();

        let store = Arc::new(
            ArtifactStore::open(dir.path(), Arc::new(Cipher::generate()))
                .await
                .expect("artifact store"),
        );
        let translator = Arc::new(translator);
        let synthesizer = Arc::new(synthesizer);
        let pipeline = Arc::new(TranslationPipeline::new(
            translator.clone(),
            synthesizer.clone(),
            store.clone(),
            config.limits.max_text_chars,
        ));

        Self {
            dir,
            config,
            store,
            translator,
            synthesizer,
            pipeline,
        }
    }

    /// A second pipeline sharing this harness's translator, synthesizer and store.
    pub fn pipeline_with(
        &self,
        enhancer: Option<Arc<MockEnhancer>>,
        recognizer: Option<Arc<MockRecognizer>>,
    ) -> TranslationPipeline {
        let mut pipeline = TranslationPipeline::new(
            self.translator.clone(),
            self.synthesizer.clone(),
            self.store.clone(),
            self.config.limits.max_text_chars,
        );
        if let Some(enhancer) = enhancer {
            pipeline = pipeline.with_enhancer(enhancer);
        }
        if let Some(recognizer) = recognizer {
            pipeline = pipeline.with_recognizer(recognizer);
        }
        pipeline
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.config.clone(),
            self.pipeline.clone(),
            self.store.clone(),
        )
    }

    pub fn app_state_with(&self, pipeline: TranslationPipeline) -> AppState {
        AppState::new(self.config.clone(), Arc::new(pipeline), self.store.clone())
    }
}
