//! On-disk storage for synthesized audio artifacts

use std::path::{Path, PathBuf};

use crate::dialogue::synthesis::is_valid_artifact_id;
use crate::{Error, Result};

/// Artifacts kept on disk by default before the oldest are pruned
pub const DEFAULT_MAX_ARTIFACTS: usize = 500;

/// Audio container formats the store serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// Formats tried when loading, in order
    pub const ALL: [Self; 2] = [Self::Mp3, Self::Wav];

    fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// File extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// HTTP content type
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }
}

/// Directory of `<artifact_id>.<ext>` files
///
/// Artifact ids start with a millisecond timestamp, so name order is age
/// order. After each write the oldest artifacts beyond `max_artifacts` are
/// removed.
#[derive(Debug, Clone)]
pub struct AudioStore {
    dir: PathBuf,
    max_artifacts: usize,
}

impl AudioStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_artifacts: DEFAULT_MAX_ARTIFACTS,
        }
    }

    /// Keep at most `max` artifacts; 0 disables pruning
    #[must_use]
    pub const fn with_max_artifacts(mut self, max: usize) -> Self {
        self.max_artifacts = max;
        self
    }

    /// Root directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an artifact would be stored at
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `artifact_id` is not a safe file stem
    pub fn path_for(&self, artifact_id: &str, format: AudioFormat) -> Result<PathBuf> {
        if !is_valid_artifact_id(artifact_id) {
            return Err(Error::InvalidInput(format!(
                "invalid artifact id: {artifact_id}"
            )));
        }
        Ok(self
            .dir
            .join(format!("{artifact_id}.{}", format.extension())))
    }

    /// Write an artifact and return its path
    ///
    /// Bytes go to a temporary file first so readers never see a partial file.
    ///
    /// # Errors
    ///
    /// Returns error if the id is invalid or the file cannot be written
    pub async fn save(&self, artifact_id: &str, format: AudioFormat, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(artifact_id, format)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!(".{artifact_id}.tmp"));
        let written = match tokio::fs::write(&tmp, bytes).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            match tokio::fs::remove_file(&tmp).await {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temporary audio file");
                }
                _ => {}
            }
            return Err(e.into());
        }

        let pruned = match self.max_artifacts {
            0 => Ok(0),
            keep => self.prune(keep).await,
        };
        if let Err(e) = pruned {
            tracing::warn!(dir = %self.dir.display(), error = %e, "failed to prune audio artifacts");
        }

        Ok(path)
    }

    /// Remove the oldest artifacts so at most `keep` remain
    ///
    /// Returns the number of files removed. Files that are not artifacts are
    /// left alone.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be listed or a file cannot be removed
    pub async fn prune(&self, keep: usize) -> Result<usize> {
        let mut artifacts = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_artifact = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(AudioFormat::from_extension)
                .is_some()
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(is_valid_artifact_id);
            if is_artifact {
                artifacts.push(path);
            }
        }

        if artifacts.len() <= keep {
            return Ok(0);
        }

        artifacts.sort();
        let excess = artifacts.len() - keep;
        for path in &artifacts[..excess] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                // A concurrent prune got there first
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(removed = excess, kept = keep, "pruned audio artifacts");
        Ok(excess)
    }

    /// Read an artifact back
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the id is invalid or no file exists for it
    pub async fn load(&self, artifact_id: &str) -> Result<(Vec<u8>, AudioFormat)> {
        if !is_valid_artifact_id(artifact_id) {
            return Err(Error::NotFound(format!("audio {artifact_id}")));
        }

        for format in AudioFormat::ALL {
            let path = self.path_for(artifact_id, format)?;
            match tokio::fs::read(&path).await {
                Ok(bytes) => return Ok((bytes, format)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::NotFound(format!("audio {artifact_id}")))
    }
}
