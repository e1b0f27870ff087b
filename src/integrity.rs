// src/integrity.rs

//! File integrity: checksum and byte size of a staged upload in one read pass

use crate::error::{Error, Result};
use crate::hash::{self, HashAlgorithm};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Checksum and size captured at ingestion time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub checksum: String,
    pub size: u64,
}

/// Computes [`FileDigest`]s with a fixed algorithm
#[derive(Debug, Clone, Copy, Default)]
pub struct FileIntegrity {
    algorithm: HashAlgorithm,
}

impl FileIntegrity {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the file at `path`
    ///
    /// Missing or unreadable files surface as `IoError`, which aborts the
    /// enclosing ingestion.
    pub fn digest(&self, path: &Path) -> Result<FileDigest> {
        let mut file = File::open(path)
            .map_err(|e| Error::IoError(format!("Failed to open {}: {e}", path.display())))?;
        let (checksum, size) = hash::hash_reader(self.algorithm, &mut file)
            .map_err(|e| Error::IoError(format!("Failed to read {}: {e}", path.display())))?;

        debug!("{} {}:{} ({} bytes)", path.display(), self.algorithm, checksum, size);
        Ok(FileDigest { checksum, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_digest_reports_size_and_checksum() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        let digest = FileIntegrity::default().digest(file.path()).unwrap();
        assert_eq!(digest.size, 11);
        assert_eq!(digest.checksum, "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let digest = FileIntegrity::new(HashAlgorithm::Md5).digest(file.path()).unwrap();
        assert_eq!(digest.size, 0);
        assert_eq!(digest.checksum, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileIntegrity::default()
            .digest(&dir.path().join("absent.uvl"))
            .unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
