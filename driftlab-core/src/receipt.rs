//! Content digests and artifact receipts.
//!
//! Every published artifact gets a sidecar `<name>.sha256` whose body is
//! `"<digest>  <filename>\n"` — a lowercase 64-hex SHA-256, exactly two
//! spaces, the bare filename, one trailing newline. The parser is strict:
//! anything that deviates from that shape is malformed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;

/// Extension used by receipt sidecar files.
pub const RECEIPT_EXTENSION: &str = "sha256";

/// Sidecar filename covering `artifact` (e.g. `metrics.csv.sha256`).
pub fn receipt_filename(artifact: &str) -> String {
    format!("{artifact}.{RECEIPT_EXTENSION}")
}

/// Lowercase hex SHA-256 of a byte slice.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lowercase hex SHA-256 of a file's exact bytes, streamed in 8 KiB chunks.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Why a receipt failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReceiptError {
    #[error("receipt is missing the two-space separator")]
    MissingSeparator,

    #[error("receipt digest {0:?} is not 64 lowercase hex characters")]
    BadDigest(String),
}

/// A parsed `.sha256` receipt: a content digest plus the filename it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub digest: String,
    pub filename: String,
}

impl Receipt {
    pub fn new(digest: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            filename: filename.into(),
        }
    }

    /// Render the wire form, trailing newline included.
    pub fn format(&self) -> String {
        format!("{}  {}\n", self.digest, self.filename)
    }

    /// Parse the wire form. Surrounding whitespace is tolerated; the
    /// two-space separator and the digest shape are not.
    pub fn parse(text: &str) -> Result<Self, ReceiptError> {
        let line = text.trim();
        let (digest, filename) = line
            .split_once("  ")
            .ok_or(ReceiptError::MissingSeparator)?;
        let hex64 = digest.len() == 64
            && digest
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !hex64 {
            return Err(ReceiptError::BadDigest(digest.to_string()));
        }
        Ok(Self {
            digest: digest.to_string(),
            filename: filename.to_string(),
        })
    }
}
