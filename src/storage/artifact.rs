use serde::Serialize;
use std::fmt;
use uuid::Uuid;

pub const ARTIFACT_EXTENSION: &str = ".mp3";

/// Name of a stored audio artifact: 32 lowercase hex digits plus `.mp3`.
///
/// Only names of exactly this shape are accepted back from clients, so a
/// reference can never point outside the artifact directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef(String);

impl ArtifactRef {
    pub fn generate() -> Self {
        Self(format!("{}{}", Uuid::new_v4().simple(), ARTIFACT_EXTENSION))
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let stem = raw.strip_suffix(ARTIFACT_EXTENSION)?;
        let is_simple_uuid = stem.len() == 32
            && stem
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        is_simple_uuid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for ArtifactRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
