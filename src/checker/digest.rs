//! # Digest Sources
//!
//! The checker never touches bitstream bytes itself; it asks a
//! `DigestSource` to stream an object and hand back its digest.
//!
//! `LocalDigestSource` reads objects stored as files below a root directory,
//! in 8 KiB chunks. SHA-256 (`sha2`) and CRC32 (`crc32fast`) are supported.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use sha2::{Digest as _, Sha256};
use thiserror::Error;

use super::errors::CheckerError;
use super::model::ObjectId;

/// A computed digest and the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub value: String,
    pub algorithm: String,
}

/// Failures of a digest computation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DigestError {
    #[error("Object bytes not found: {0}")]
    NotFound(ObjectId),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid object path: {0}")]
    InvalidPath(String),
}

impl DigestError {
    /// Whether the object's bytes are permanently gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DigestError::NotFound(_))
    }
}

/// Computes digests over stored bitstreams.
pub trait DigestSource: Send + Sync {
    fn compute_digest(&self, id: &ObjectId) -> Result<Digest, DigestError>;
}

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Crc32,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Crc32 => "CRC32",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CheckerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SHA-256" | "SHA256" => Ok(DigestAlgorithm::Sha256),
            "CRC32" => Ok(DigestAlgorithm::Crc32),
            other => Err(CheckerError::Config(format!(
                "Unsupported digest algorithm: {}",
                other
            ))),
        }
    }
}

enum Hasher {
    Sha256(Sha256),
    Crc32(crc32fast::Hasher),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
            DigestAlgorithm::Crc32 => Hasher::Crc32(crc32fast::Hasher::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Sha256(h) => h.update(data),
            Hasher::Crc32(h) => h.update(data),
        }
    }

    fn finish(self) -> String {
        match self {
            Hasher::Sha256(h) => format!("{:x}", h.finalize()),
            Hasher::Crc32(h) => format!("{:08x}", h.finalize()),
        }
    }
}

/// Digest over an in-memory buffer.
pub fn digest_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> String {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finish()
}

/// Bitstreams stored as files below `root`; object id = relative path.
#[derive(Debug, Clone)]
pub struct LocalDigestSource {
    root: PathBuf,
    algorithm: DigestAlgorithm,
}

impl LocalDigestSource {
    pub fn new(root: impl Into<PathBuf>, algorithm: DigestAlgorithm) -> Self {
        Self {
            root: root.into(),
            algorithm,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    fn object_path(&self, id: &ObjectId) -> Result<PathBuf, DigestError> {
        let relative = Path::new(id.as_str());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(DigestError::InvalidPath(id.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl DigestSource for LocalDigestSource {
    fn compute_digest(&self, id: &ObjectId) -> Result<Digest, DigestError> {
        let path = self.object_path(id)?;
        let file = File::open(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DigestError::NotFound(id.clone())
            } else {
                DigestError::Io(format!("{}: {}", path.display(), e))
            }
        })?;

        let mut reader = BufReader::new(file);
        let mut hasher = Hasher::new(self.algorithm);
        let mut buffer = [0u8; 8192];

        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|e| DigestError::Io(format!("{}: {}", path.display(), e)))?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        Ok(Digest {
            value: hasher.finish(),
            algorithm: self.algorithm.name().to_string(),
        })
    }
}

/// Scripted digest source for tests and dry runs.
///
/// Unknown objects report `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryDigestSource {
    results: RwLock<HashMap<ObjectId, Result<Digest, DigestError>>>,
}

impl MemoryDigestSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_digest(&self, id: &ObjectId, value: &str, algorithm: &str) {
        self.set(
            id,
            Ok(Digest {
                value: value.to_string(),
                algorithm: algorithm.to_string(),
            }),
        );
    }

    pub fn set_failure(&self, id: &ObjectId, error: DigestError) {
        self.set(id, Err(error));
    }

    fn set(&self, id: &ObjectId, result: Result<Digest, DigestError>) {
        if let Ok(mut results) = self.results.write() {
            results.insert(id.clone(), result);
        }
    }
}

impl DigestSource for MemoryDigestSource {
    fn compute_digest(&self, id: &ObjectId) -> Result<Digest, DigestError> {
        let results = self
            .results
            .read()
            .map_err(|_| DigestError::Io("Lock poisoned".to_string()))?;
        results
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(DigestError::NotFound(id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn id(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            digest_bytes(DigestAlgorithm::Sha256, b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(digest_bytes(DigestAlgorithm::Crc32, b"123456789"), "cbf43926");
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!("sha-256".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Sha256);
        assert_eq!("CRC32".parse::<DigestAlgorithm>().unwrap(), DigestAlgorithm::Crc32);
        assert!("MD2".parse::<DigestAlgorithm>().is_err());
    }

    #[test]
    fn test_local_source_streams_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("12/34")).unwrap();
        let data = vec![0xABu8; 20_000];
        fs::write(temp.path().join("12/34/obj"), &data).unwrap();

        let source = LocalDigestSource::new(temp.path(), DigestAlgorithm::Sha256);
        let digest = source.compute_digest(&id("12/34/obj")).unwrap();

        assert_eq!(digest.value, digest_bytes(DigestAlgorithm::Sha256, &data));
        assert_eq!(digest.algorithm, "SHA-256");
    }

    #[test]
    fn test_local_source_missing_file() {
        let temp = TempDir::new().unwrap();
        let source = LocalDigestSource::new(temp.path(), DigestAlgorithm::Crc32);

        let err = source.compute_digest(&id("gone")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_local_source_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let source = LocalDigestSource::new(temp.path(), DigestAlgorithm::Sha256);

        let err = source.compute_digest(&id("../etc/passwd")).unwrap_err();
        assert!(matches!(err, DigestError::InvalidPath(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_memory_source_scripted() {
        let source = MemoryDigestSource::new();
        source.set_digest(&id("a"), "abc", "SHA-256");
        source.set_failure(&id("b"), DigestError::Io("timeout".into()));

        assert_eq!(source.compute_digest(&id("a")).unwrap().value, "abc");
        assert!(matches!(source.compute_digest(&id("b")), Err(DigestError::Io(_))));
        assert!(source.compute_digest(&id("c")).unwrap_err().is_not_found());
    }
}
