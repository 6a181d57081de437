//! # Supported Languages
//!
//! The fixed set of languages the service can translate between. Every code
//! that reaches the pipeline has already been parsed into a [`LanguageCode`],
//! so an unsupported code is rejected before any external service is called.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// One of the 13 supported languages, identified by its ISO 639-1 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    En,
    Es,
    Fr,
    De,
    Zh,
    Ar,
    Hi,
    It,
    Pt,
    Ru,
    Ja,
    Ko,
    Tr,
}

/// Returned when a code is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code: {0}")]
pub struct UnsupportedLanguage(pub String);

impl LanguageCode {
    /// All supported languages in display order.
    pub const ALL: [LanguageCode; 13] = [
        LanguageCode::En,
        LanguageCode::Es,
        LanguageCode::Fr,
        LanguageCode::De,
        LanguageCode::Zh,
        LanguageCode::Ar,
        LanguageCode::Hi,
        LanguageCode::It,
        LanguageCode::Pt,
        LanguageCode::Ru,
        LanguageCode::Ja,
        LanguageCode::Ko,
        LanguageCode::Tr,
    ];

    /// The two-letter code clients send and receive.
    pub fn code(&self) -> &'static str {
        match self {
            LanguageCode::En => "en",
            LanguageCode::Es => "es",
            LanguageCode::Fr => "fr",
            LanguageCode::De => "de",
            LanguageCode::Zh => "zh",
            LanguageCode::Ar => "ar",
            LanguageCode::Hi => "hi",
            LanguageCode::It => "it",
            LanguageCode::Pt => "pt",
            LanguageCode::Ru => "ru",
            LanguageCode::Ja => "ja",
            LanguageCode::Ko => "ko",
            LanguageCode::Tr => "tr",
        }
    }

    /// English display name, as shown in the language pickers.
    pub fn name(&self) -> &'static str {
        match self {
            LanguageCode::En => "English",
            LanguageCode::Es => "Spanish",
            LanguageCode::Fr => "French",
            LanguageCode::De => "German",
            LanguageCode::Zh => "Chinese",
            LanguageCode::Ar => "Arabic",
            LanguageCode::Hi => "Hindi",
            LanguageCode::It => "Italian",
            LanguageCode::Pt => "Portuguese",
            LanguageCode::Ru => "Russian",
            LanguageCode::Ja => "Japanese",
            LanguageCode::Ko => "Korean",
            LanguageCode::Tr => "Turkish",
        }
    }

    /// Code understood by the Google translate and speech endpoints.
    ///
    /// Google needs a script/region for Chinese; every other code is sent as is.
    pub fn google_code(&self) -> &'static str {
        match self {
            LanguageCode::Zh => "zh-CN",
            other => other.code(),
        }
    }
}

impl FromStr for LanguageCode {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        LanguageCode::ALL
            .iter()
            .copied()
            .find(|lang| lang.code() == normalized)
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for LanguageCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}
