use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::artifact::ArtifactRef;
use crate::security::{Cipher, CipherError};

/// Prefix of the private name an artifact is renamed to while being served.
const CLAIM_PREFIX: &str = ".claim-";
const MAX_NAME_ATTEMPTS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("artifact {0} failed integrity check")]
    Integrity(String),
    #[error("artifact storage failed: {0}")]
    Storage(#[from] io::Error),
    #[error("could not seal artifact: {0}")]
    Seal(#[from] CipherError),
}

/// Encrypted, single-use audio files under one directory.
///
/// The store is stateless apart from the directory itself: uniqueness comes
/// from uuid names created with create-new semantics, and single-use reads
/// come from an atomic rename, so any number of requests may call into it
/// concurrently.
#[derive(Debug)]
pub struct ArtifactStore {
    root: PathBuf,
    cipher: Arc<Cipher>,
    #[cfg(test)]
    write_fault: Option<io::ErrorKind>,
}

impl ArtifactStore {
    pub async fn open(root: impl Into<PathBuf>, cipher: Arc<Cipher>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            cipher,
            #[cfg(test)]
            write_fault: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    /// Seal `audio` and write it under a fresh reference.
    ///
    /// The plaintext is encrypted in memory, so it is never written to disk.
    /// A failed write removes the partial file before returning.
    pub async fn store(&self, audio: &[u8]) -> Result<ArtifactRef, StoreError> {
        let sealed = self.cipher.encrypt(audio)?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let reference = ArtifactRef::generate();
            let path = self.path_for(&reference);

            let file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(artifact = %reference, "Artifact name collision, regenerating");
                    continue;
                }
                Err(e) => return Err(StoreError::Storage(e)),
            };

            if let Err(e) = self.persist(file, &sealed).await {
                if let Err(cleanup) = fs::remove_file(&path).await {
                    error!(artifact = %reference, error = %cleanup, "Failed to remove partial artifact");
                }
                return Err(StoreError::Storage(e));
            }

            debug!(artifact = %reference, sealed_bytes = sealed.len(), "Artifact stored");
            return Ok(reference);
        }

        Err(StoreError::Storage(io::Error::new(
            io::ErrorKind::AlreadyExists,
            "could not allocate a unique artifact name",
        )))
    }

    /// Read, delete and decrypt an artifact.
    ///
    /// The file is first renamed to a private claim name; only one caller can
    /// win that rename, every other caller sees `NotFound`. A corrupt artifact
    /// is deleted all the same and reported as `Integrity`.
    pub async fn retrieve(&self, reference: &ArtifactRef) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(reference);
        let claimed = self.root.join(format!(
            "{}{}-{}",
            CLAIM_PREFIX,
            reference,
            Uuid::new_v4().simple()
        ));

        match fs::rename(&path, &claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(reference.to_string()));
            }
            Err(e) => return Err(StoreError::Storage(e)),
        }

        let sealed = self.take_claimed(&claimed, reference).await?;

        let audio = self
            .cipher
            .decrypt(&sealed)
            .map_err(|_| StoreError::Integrity(reference.to_string()))?;

        debug!(artifact = %reference, audio_bytes = audio.len(), "Artifact retrieved");
        Ok(audio)
    }

    /// Like [`retrieve`](Self::retrieve) for a raw client-supplied name.
    pub async fn retrieve_named(&self, raw: &str) -> Result<Vec<u8>, StoreError> {
        let reference =
            ArtifactRef::parse(raw).ok_or_else(|| StoreError::NotFound(raw.to_string()))?;
        self.retrieve(&reference).await
    }

    /// Delete artifacts (and abandoned claims) older than `ttl`.
    pub async fn sweep_expired(&self, ttl: Duration) -> Result<usize, StoreError> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            if !is_managed(&entry.file_name().to_string_lossy()) {
                continue;
            }
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Cannot read artifact age");
                    continue;
                }
            };
            let age = now.duration_since(modified).unwrap_or_default();
            if age >= ttl {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    // Retrieved concurrently, nothing left to sweep
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "Cannot remove expired artifact");
                    }
                }
            }
        }

        Ok(removed)
    }

    /// Delete every artifact regardless of age.
    pub async fn purge(&self) -> Result<usize, StoreError> {
        self.sweep_expired(Duration::ZERO).await
    }

    /// Number of artifacts currently waiting to be retrieved.
    pub async fn live_count(&self) -> Result<usize, StoreError> {
        let mut count = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if ArtifactRef::parse(&entry.file_name().to_string_lossy()).is_some() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn path_for(&self, reference: &ArtifactRef) -> PathBuf {
        self.root.join(reference.as_str())
    }

    /// Read and delete a claimed file. A claim that vanished (swept after it
    /// expired) is reported as `NotFound`, like an unknown artifact.
    async fn take_claimed(
        &self,
        claimed: &Path,
        reference: &ArtifactRef,
    ) -> Result<Vec<u8>, StoreError> {
        let read = fs::read(claimed).await;
        match fs::remove_file(claimed).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(artifact = %reference, error = %e, "Failed to delete claimed artifact"),
        }
        match read {
            Ok(sealed) => Ok(sealed),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(reference.to_string()))
            }
            Err(e) => Err(StoreError::Storage(e)),
        }
    }

    /// Write the sealed bytes into a freshly created file and sync it.
    async fn persist(&self, mut file: fs::File, sealed: &[u8]) -> io::Result<()> {
        #[cfg(test)]
        if let Some(kind) = self.write_fault {
            let mut failing = tests::FailingWriter::new(&mut file, sealed.len() / 2, kind);
            return write_sealed(&mut failing, sealed).await;
        }
        write_sealed(&mut file, sealed).await?;
        file.sync_all().await
    }

    /// Make every write fail part way through the sealed blob.
    #[cfg(test)]
    fn with_write_fault(mut self, kind: io::ErrorKind) -> Self {
        self.write_fault = Some(kind);
        self
    }
}

fn is_managed(file_name: &str) -> bool {
    file_name.starts_with(CLAIM_PREFIX) || ArtifactRef::parse(file_name).is_some()
}

async fn write_sealed<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    writer.write_all(bytes).await?;
    writer.flush().await
}
