//! # Artifact Storage
//!
//! Ephemeral, file-backed storage for synthesized audio. Each artifact is
//! sealed by the [`Cipher`](crate::security::Cipher) before it is written,
//! handed out by reference, and destroyed the first time it is read.
//!
//! ## Lifecycle:
//! stored (encrypted file) → claimed (renamed, private) → read → deleted
//!
//! Unclaimed artifacts are removed by the sweeper once they exceed the
//! configured TTL.

pub mod artifact;
pub mod store;

pub use artifact::ArtifactRef;
pub use store::{ArtifactStore, StoreError};
