//! # Configuration Management
//!
//! This module loads the application configuration from multiple sources:
//! - TOML configuration files (config.toml)
//! - Environment variables (with the APP_ prefix)
//! - Default values (built into the code)
//!
//! ## Key Rust Concepts Used:
//! - **Serde**: Derive macros convert between Rust structs and TOML/env data
//! - **Option<T>**: Settings that may legitimately be absent (like an injected cipher key)
//! - **Result<T, E>**: Loading and validation both report failures instead of panicking
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Platform variables (HOST, PORT, OPENAI_API_KEY, CIPHER_KEY)
//! 2. Environment variables (APP_SERVER__PORT, APP_OPENAI__API_KEY, etc.)
//! 3. Configuration file (config.toml)
//! 4. Default values (defined in the Default impl)
//!
//! Nested keys are separated with a double underscore so that field names
//! containing underscores (`api_key`, `artifact_dir`) survive intact.
//!
//! The loaded configuration is never mutated afterwards: it is wrapped in an
//! `Arc` at startup and shared read-only with every request.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main application configuration that groups every settings section.
///
/// ## Rust Concepts:
/// - **#[derive(...)]**: `Serialize` lets us feed the defaults into the `config`
///   crate, `Deserialize` lets the crate hand the merged result back to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub services: ServicesConfig,
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub limits: LimitsConfig,
}

/// Where the HTTP server listens.
///
/// - `host = "127.0.0.1"`: Only accept connections from localhost (development)
/// - `host = "0.0.0.0"`: Accept connections from any address (containers, production)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Endpoints of the translation and text-to-speech providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Google translate endpoint (the `gtx` client used by browser extensions)
    pub translate_url: String,
    /// Google translate text-to-speech endpoint, returns MP3
    pub tts_url: String,
    /// Upper bound for any single external call, in seconds
    pub request_timeout_secs: u64,
}

/// OpenAI settings shared by transcription enhancement and speech recognition.
///
/// Both features are optional: without an API key the pipeline simply skips
/// enhancement, and the transcription endpoint reports that no recognizer is
/// configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub enable_enhancement: bool,
    pub enhancement_model: String,
    /// Prompt prefix; the transcript is appended after it
    pub enhancement_prompt: String,
    pub max_tokens: u32,
    pub enable_transcription: bool,
    pub transcription_model: String,
}

/// Where encrypted audio artifacts live and how long unclaimed ones survive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub artifact_dir: String,
    /// Age after which an unretrieved artifact is swept; 0 disables the sweeper
    pub artifact_ttl_secs: u64,
    pub sweep_interval_secs: u64,
}

/// At-rest encryption settings.
///
/// ## Key lifetime:
/// With `cipher_key` unset (the default) a fresh key is generated at every
/// start, so artifacts written by a previous process can never be decrypted.
/// Setting a base64-encoded 32-byte key makes artifacts readable across
/// restarts. The key is never printed by the `Debug` impl below.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cipher_key: Option<String>,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field(
                "cipher_key",
                &self.cipher_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Request size limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Longest text accepted by the translation pipeline, in characters
    pub max_text_chars: usize,
    /// Largest audio upload accepted by the transcription endpoint, in bytes
    pub max_upload_bytes: usize,
}

/// Provides default configuration values.
///
/// ## Why defaults matter:
/// The service starts with no configuration file at all. Only the OpenAI key
/// is missing by default, which turns the two OpenAI-backed features off.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            services: ServicesConfig {
                translate_url: "https://translate.googleapis.com/translate_a/single".to_string(),
                tts_url: "https://translate.google.com/translate_tts".to_string(),
                request_timeout_secs: 30,
            },
            openai: OpenAiConfig {
                api_key: String::new(),
                base_url: "https://api.openai.com/v1".to_string(),
                enable_enhancement: true,
                enhancement_model: "gpt-4o-mini".to_string(),
                enhancement_prompt: "Enhance the following medical transcription for accuracy:"
                    .to_string(),
                max_tokens: 100,
                enable_transcription: true,
                transcription_model: "whisper-1".to_string(),
            },
            storage: StorageConfig {
                artifact_dir: "artifacts".to_string(),
                artifact_ttl_secs: 900,   // 15 minutes to fetch the audio
                sweep_interval_secs: 60,
            },
            security: SecurityConfig::default(),
            limits: LimitsConfig {
                max_text_chars: 5000,
                max_upload_bytes: 25 * 1024 * 1024, // Whisper API upload limit
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from every source in priority order.
    ///
    /// ## Environment Variable Examples:
    /// - `APP_SERVER__PORT=3000`: Override server port
    /// - `APP_STORAGE__ARTIFACT_DIR=/tmp/artifacts`: Move the artifact directory
    /// - `APP_OPENAI__ENABLE_ENHANCEMENT=false`: Turn enhancement off
    /// - `HOST` / `PORT`: Special cases for deployment platforms
    /// - `OPENAI_API_KEY`: The conventional variable for the OpenAI key
    /// - `CIPHER_KEY`: Base64 key for artifacts that must survive restarts
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(app_environment());

        if let Ok(host) = env::var("HOST") {
            settings = settings.set_override("server.host", host)?;
        }

        if let Ok(port) = env::var("PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            settings = settings.set_override("openai.api_key", api_key)?;
        }

        if let Ok(cipher_key) = env::var("CIPHER_KEY") {
            settings = settings.set_override("security.cipher_key", cipher_key)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - External calls have a non-zero timeout
    /// - Size limits are non-zero
    /// - The sweeper has a non-zero interval whenever a TTL is configured
    /// - An injected cipher key is base64 and exactly 32 bytes long
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Server port cannot be 0"));
        }

        if self.services.request_timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be greater than 0"));
        }

        if self.limits.max_text_chars == 0 {
            return Err(anyhow!("Max text length must be greater than 0"));
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(anyhow!("Max upload size must be greater than 0"));
        }

        if self.storage.artifact_dir.trim().is_empty() {
            return Err(anyhow!("Artifact directory cannot be empty"));
        }

        if self.storage.artifact_ttl_secs > 0 && self.storage.sweep_interval_secs == 0 {
            return Err(anyhow!(
                "Sweep interval must be greater than 0 when an artifact TTL is set"
            ));
        }

        if let Some(key) = &self.security.cipher_key {
            let decoded = STANDARD
                .decode(key.trim())
                .map_err(|e| anyhow!("Cipher key is not valid base64: {}", e))?;
            if decoded.len() != 32 {
                return Err(anyhow!(
                    "Cipher key must decode to 32 bytes, got {}",
                    decoded.len()
                ));
            }
        }

        Ok(())
    }

    /// Timeout applied to every outbound HTTP call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.services.request_timeout_secs)
    }

    /// Whether transcript enhancement can actually run.
    pub fn enhancement_available(&self) -> bool {
        self.openai.enable_enhancement && !self.openai.api_key.trim().is_empty()
    }

    /// Whether the speech recognizer can actually run.
    pub fn transcription_available(&self) -> bool {
        self.openai.enable_transcription && !self.openai.api_key.trim().is_empty()
    }
}

/// `APP_<SECTION>__<KEY>` variables, e.g. `APP_STORAGE__ARTIFACT_TTL_SECS`.
fn app_environment() -> config::Environment {
    config::Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.security.cipher_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.services.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.sweep_interval_secs = 0;
        assert!(config.validate().is_err());

        // A zero TTL disables the sweeper, so the interval no longer matters
        config.storage.artifact_ttl_secs = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cipher_key_validation() {
        let mut config = AppConfig::default();
        config.security.cipher_key = Some(STANDARD.encode([7u8; 32]));
        assert!(config.validate().is_ok());

        config.security.cipher_key = Some(STANDARD.encode([7u8; 16]));
        assert!(config.validate().is_err());

        config.security.cipher_key = Some("not base64!".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_optional_features_need_api_key() {
        let mut config = AppConfig::default();
        assert!(!config.enhancement_available());
        assert!(!config.transcription_available());

        config.openai.api_key = "sk-test".to_string();
        assert!(config.enhancement_available());
        assert!(config.transcription_available());

        config.openai.enable_enhancement = false;
        assert!(!config.enhancement_available());
    }

    #[test]
    fn test_debug_redacts_cipher_key() {
        let security = SecurityConfig {
            cipher_key: Some("c2VjcmV0".to_string()),
        };
        let printed = format!("{:?}", security);
        assert!(!printed.contains("c2VjcmV0"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_defaults_round_trip_through_config_builder() {
        let built: AppConfig = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(built.storage.artifact_dir, "artifacts");
        assert_eq!(built.limits.max_text_chars, 5000);
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        let vars = config::Map::from([
            ("APP_SERVER__PORT".to_string(), "9090".to_string()),
            ("APP_STORAGE__ARTIFACT_DIR".to_string(), "/tmp/audio".to_string()),
            ("APP_OPENAI__ENABLE_ENHANCEMENT".to_string(), "false".to_string()),
        ]);
        let built: AppConfig = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default()).unwrap())
            .add_source(app_environment().source(Some(vars)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(built.server.port, 9090);
        assert_eq!(built.storage.artifact_dir, "/tmp/audio");
        assert!(!built.openai.enable_enhancement);
    }
}
