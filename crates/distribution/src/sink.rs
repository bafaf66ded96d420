//! Artifact sinks

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::{DistributionError, Result};

/// One named output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Destination for a run's artifacts.
///
/// `publish` receives everything a run produced in one call, so an
/// implementation can make the whole set visible together or not at all.
pub trait ArtifactSink {
    fn publish(&mut self, artifacts: &[Artifact]) -> Result<()>;
}

/// Writes artifacts as files in one directory.
///
/// Every artifact is first written to `<name>.tmp`; the renames into place
/// only start once all temporary files exist. A write failure removes the
/// temporary files and leaves previously published files untouched. A set
/// naming the same file twice is refused before anything is written.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn tmp_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.tmp", name))
    }

    fn discard(paths: &[PathBuf]) {
        for path in paths {
            if let Err(e) = std::fs::remove_file(path) {
                warn!("Failed to remove temporary file {}: {}", path.display(), e);
            }
        }
    }
}

impl ArtifactSink for DirectorySink {
    fn publish(&mut self, artifacts: &[Artifact]) -> Result<()> {
        let mut names = HashSet::new();
        for artifact in artifacts {
            if !names.insert(artifact.name.as_str()) {
                return Err(DistributionError::DuplicateArtifact(artifact.name.clone()));
            }
        }

        std::fs::create_dir_all(&self.dir).map_err(|source| DistributionError::CreateDirError {
            path: self.dir.display().to_string(),
            source,
        })?;

        let mut staged: Vec<PathBuf> = Vec::with_capacity(artifacts.len());
        for artifact in artifacts {
            let tmp_path = self.tmp_path(&artifact.name);
            if let Err(source) = std::fs::write(&tmp_path, &artifact.bytes) {
                staged.push(tmp_path.clone());
                Self::discard(&staged);
                return Err(DistributionError::WriteError {
                    path: tmp_path.display().to_string(),
                    source,
                });
            }
            debug!("Staged {} ({} bytes)", tmp_path.display(), artifact.bytes.len());
            staged.push(tmp_path);
        }

        for (i, artifact) in artifacts.iter().enumerate() {
            let final_path = self.dir.join(&artifact.name);
            if let Err(source) = std::fs::rename(&staged[i], &final_path) {
                Self::discard(&staged[i..]);
                return Err(DistributionError::WriteError {
                    path: final_path.display().to_string(),
                    source,
                });
            }
        }

        info!("Published {} artifacts to {}", artifacts.len(), self.dir.display());
        Ok(())
    }
}

/// Keeps artifacts in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

impl ArtifactSink for MemorySink {
    fn publish(&mut self, artifacts: &[Artifact]) -> Result<()> {
        for artifact in artifacts {
            self.artifacts
                .insert(artifact.name.clone(), artifact.bytes.clone());
        }
        Ok(())
    }
}
