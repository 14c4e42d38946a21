// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! BLNN binary format
//!
//! ```text
//! [Header - 12 bytes]
//! - Magic: "BLNN" (4 bytes)
//! - Version: u32 LE (4 bytes)
//! - Content type: u32 LE (4 bytes, 0 = network, 1 = weights, 2 = learning state)
//! [Checksum - 8 bytes]
//! - u64 LE, FNV-1a of the payload
//! [Payload - from byte 20]
//! - Bincode-serialized document
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::{ContentType, Document, DOCUMENT_VERSION};
use crate::error::{PersistenceError, Result};
use crate::{NetworkPersistence, PersistenceFormat};

pub const MAGIC: &[u8; 4] = b"BLNN";
pub const HEADER_LEN: usize = 12;
pub const CHECKSUM_LEN: usize = 8;
/// Payload start: header followed by the checksum
pub const PAYLOAD_OFFSET: usize = HEADER_LEN + CHECKSUM_LEN;

/// Reads and writes BLNN files
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryPersistence;

impl BinaryPersistence {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(document: &Document) -> Result<Vec<u8>> {
        let payload = match document {
            Document::Network(d) => serialize(d)?,
            Document::Weights(d) => serialize(d)?,
            Document::LearningState(d) => serialize(d)?,
        };
        let mut bytes = Vec::with_capacity(PAYLOAD_OFFSET + payload.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&DOCUMENT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&document.content_type().code().to_le_bytes());
        bytes.extend_from_slice(&calculate_checksum(&payload).to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Decode a BLNN buffer holding `expected` content
    pub fn decode(bytes: &[u8], expected: ContentType) -> Result<Document> {
        let magic: [u8; 4] = take(bytes, 0, "magic")?;
        if &magic != MAGIC {
            return Err(PersistenceError::InvalidMagic(magic));
        }

        let version = u32::from_le_bytes(take(bytes, 4, "version")?);
        if version != DOCUMENT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                found: version,
                supported: DOCUMENT_VERSION,
            });
        }

        let code = u32::from_le_bytes(take(bytes, 8, "content type")?);
        let content =
            ContentType::from_code(code).ok_or(PersistenceError::UnknownContentType(code))?;
        if content != expected {
            return Err(PersistenceError::ContentTypeMismatch {
                expected,
                found: content,
            });
        }

        let checksum = u64::from_le_bytes(take(bytes, HEADER_LEN, "checksum")?);
        let payload = &bytes[PAYLOAD_OFFSET..];
        if calculate_checksum(payload) != checksum {
            return Err(PersistenceError::ChecksumMismatch);
        }

        Ok(match content {
            ContentType::Network => Document::Network(deserialize(payload)?),
            ContentType::Weights => Document::Weights(deserialize(payload)?),
            ContentType::LearningState => Document::LearningState(deserialize(payload)?),
        })
    }
}

impl NetworkPersistence for BinaryPersistence {
    fn format(&self) -> PersistenceFormat {
        PersistenceFormat::Binary
    }

    fn write_document(&self, document: &Document, path: &Path) -> Result<()> {
        let bytes = Self::encode(document)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    fn read_document(&self, path: &Path, expected: ContentType) -> Result<Document> {
        let mut bytes = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;
        Self::decode(&bytes, expected)
    }
}

fn take<const N: usize>(bytes: &[u8], offset: usize, field: &'static str) -> Result<[u8; N]> {
    bytes
        .get(offset..offset + N)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(PersistenceError::Truncated(field))
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value).map_err(|e| PersistenceError::Serialization(e.to_string()))
}

fn deserialize<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    bincode::deserialize(payload).map_err(|e| PersistenceError::Deserialization(e.to_string()))
}

/// FNV-1a over the payload
pub(crate) fn calculate_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
