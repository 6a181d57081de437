//! # Healthcare Translator Backend - Main Application Entry Point
//!
//! HTTP service that lets a patient and a provider talk across a language
//! barrier: a transcript goes in, translated text and a one-time link to
//! spoken audio come out.
//!
//! ## Key Rust Concepts Used:
//! - **async/await**: Every external call (translation, speech, storage) is awaited
//! - **modules**: Code is organized into separate modules (mod statements)
//! - **Result<T, E>**: Error handling using Rust's Result type
//! - **Arc**: The pipeline and artifact store are shared by every worker
//! - **Trait objects**: Providers sit behind `dyn Translator` and friends, so
//!   tests swap in mocks
//!
//! ## Application Architecture:
//! - **config**: Layered configuration (defaults, config.toml, environment)
//! - **language**: The 13 supported language codes
//! - **security**: Authenticated encryption of stored audio
//! - **storage**: Single-use encrypted artifact store on disk
//! - **services**: HTTP clients for Google translate/TTS and OpenAI
//! - **pipeline**: Enhance → translate → synthesize → encrypt
//! - **handlers**: HTTP request handlers for API endpoints
//! - **state / health / middleware**: Shared state, health and metrics
//! - **error**: Custom error types and HTTP error responses

mod config;
mod error;
mod handlers;
mod health;
mod language;
mod middleware;
mod pipeline;
mod security;
mod services;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use crate::config::AppConfig;
use pipeline::TranslationPipeline;
use security::Cipher;
use services::{GoogleSpeechSynthesizer, GoogleTranslator, OpenAiEnhancer, OpenAiSpeechRecognizer};
use state::AppState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::ArtifactStore;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Global shutdown signal, set by the signal handler task.
static SHUTDOWN_SIGNAL: AtomicBool = AtomicBool::new(false);

/// The main application entry point.
///
/// ## What this function does:
/// 1. **Loads configuration** from files and environment variables
/// 2. **Sets up logging** for debugging and monitoring
/// 3. **Builds the cipher and artifact store**, purging leftovers that the
///    current key could never decrypt
/// 4. **Wires the providers into the pipeline**
/// 5. **Starts the artifact sweeper** and the HTTP server
/// 6. **Handles graceful shutdown** when receiving system signals
#[actix_web::main]
async fn main() -> Result<()> {
    // It's fine if there's no .env file
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Starting healthcare-translator-backend v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {}:{}", config.server.host, config.server.port);

    let cipher = Arc::new(Cipher::from_config(&config.security)?);
    if cipher.is_ephemeral() {
        warn!("No cipher key configured; generated an ephemeral key, audio will not survive a restart");
    }

    let store = Arc::new(
        ArtifactStore::open(&config.storage.artifact_dir, cipher.clone())
            .await
            .with_context(|| format!("Failed to open artifact directory {}", config.storage.artifact_dir))?,
    );
    info!(dir = %store.root().display(), "Artifact store ready");
    if cipher.is_ephemeral() {
        let purged = store.purge().await?;
        if purged > 0 {
            info!(purged, "Removed artifacts sealed with a previous key");
        }
    }

    let pipeline = Arc::new(build_pipeline(&config, store.clone())?);
    info!(
        enhancement = pipeline.has_enhancer(),
        transcription = pipeline.has_recognizer(),
        "Translation pipeline ready"
    );

    spawn_sweeper(&config, store.clone());

    let app_state = AppState::new(config.clone(), pipeline, store);
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    setup_signal_handlers();

    info!("Starting HTTP server on {}", bind_addr);

    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            // Middleware runs in reverse order of registration for responses
            .wrap(middleware::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Server error: {}", e),
                Err(e) => error!("Server task error: {}", e),
            }
        }
        _ = wait_for_shutdown() => {
            info!("Shutdown signal received, stopping server...");
            server_handle.stop(true).await;
        }
    }

    info!("Server stopped gracefully");
    Ok(())
}

/// Initialize the tracing (logging) system for the application.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "debug", "info")
/// - If not set, defaults to "healthcare_translator_backend=debug,actix_web=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "healthcare_translator_backend=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Wire the configured providers into a pipeline.
///
/// Google translate and speech are always present. OpenAI enhancement and
/// transcription are attached only when enabled and an API key is set;
/// without them enhancement is skipped and `/transcribe/` reports an error.
fn build_pipeline(config: &AppConfig, store: Arc<ArtifactStore>) -> Result<TranslationPipeline> {
    let client = services::http_client(config.request_timeout())
        .context("Failed to build HTTP client")?;

    let mut pipeline = TranslationPipeline::new(
        Arc::new(GoogleTranslator::new(client.clone(), &config.services.translate_url)),
        Arc::new(GoogleSpeechSynthesizer::new(client.clone(), &config.services.tts_url)),
        store,
        config.limits.max_text_chars,
    );

    if config.enhancement_available() {
        pipeline = pipeline.with_enhancer(Arc::new(OpenAiEnhancer::new(client.clone(), &config.openai)));
    } else {
        info!("Transcript enhancement disabled (no OpenAI key or turned off)");
    }

    if config.transcription_available() {
        pipeline = pipeline.with_recognizer(Arc::new(OpenAiSpeechRecognizer::new(client, &config.openai)));
    } else {
        info!("Speech transcription disabled (no OpenAI key or turned off)");
    }

    Ok(pipeline)
}

/// Periodically delete artifacts nobody collected within the TTL.
fn spawn_sweeper(config: &AppConfig, store: Arc<ArtifactStore>) {
    if config.storage.artifact_ttl_secs == 0 {
        info!("Artifact TTL is 0, sweeper disabled");
        return;
    }

    let ttl = Duration::from_secs(config.storage.artifact_ttl_secs);
    let every = Duration::from_secs(config.storage.sweep_interval_secs);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.sweep_expired(ttl).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Swept expired artifacts"),
                Err(e) => warn!(error = %e, "Artifact sweep failed"),
            }
        }
    });
}

/// Set up signal handlers for graceful shutdown.
///
/// Listens for SIGTERM and SIGINT; whichever arrives first sets the global
/// shutdown flag. If a handler cannot be installed the server keeps running
/// and only the default signal behaviour applies.
fn setup_signal_handlers() {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to install signal handlers: {}", e);
                    return;
                }
            };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }

        SHUTDOWN_SIGNAL.store(true, Ordering::SeqCst);
    });
}

/// Poll the shutdown flag every 100ms.
async fn wait_for_shutdown() {
    while !SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
