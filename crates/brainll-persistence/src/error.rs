// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use brainll_npu_engine::NetworkError;
use thiserror::Error;

use crate::document::ContentType;

/// Persistence errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid magic number: expected BLNN, got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("Unsupported format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Unknown content type code {0}")]
    UnknownContentType(u32),

    #[error("Content type mismatch: expected {expected}, file holds {found}")]
    ContentTypeMismatch {
        expected: ContentType,
        found: ContentType,
    },

    #[error("Checksum mismatch: file may be corrupted")]
    ChecksumMismatch,

    #[error("File truncated: {0}")]
    Truncated(&'static str),

    #[error("Unknown persistence format '{0}' (expected json or binary)")]
    UnknownFormat(String),

    #[error("Invalid network data: {0}")]
    Network(#[from] NetworkError),
}

pub type Result<T> = std::result::Result<T, PersistenceError>;
