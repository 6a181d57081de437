use serde::Serialize;
use std::fmt;

/// Where a request is in the pipeline. Used in logs and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Received,
    Transcribing,
    Enhancing,
    Translating,
    Synthesizing,
    Encrypting,
    Stored,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Transcribing => "transcribing",
            Stage::Enhancing => "enhancing",
            Stage::Translating => "translating",
            Stage::Synthesizing => "synthesizing",
            Stage::Encrypting => "encrypting",
            Stage::Stored => "stored",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
