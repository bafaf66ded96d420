//! Input sources

use std::path::PathBuf;

use crate::{IngestError, Result};

/// Something that yields the raw bytes of one eligibility table.
pub trait InputSource {
    /// Name used in logs and skip reports.
    fn name(&self) -> &str;

    /// Read the full contents.
    fn read(&self) -> Result<Vec<u8>>;
}

/// A delimited file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path.display().to_string();
        Self { path, name }
    }
}

impl InputSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|source| IngestError::ReadError {
            name: self.name.clone(),
            source,
        })
    }
}

/// An in-memory table, mostly for tests and piping.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

impl InputSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
