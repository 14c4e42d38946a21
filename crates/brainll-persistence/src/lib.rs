// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # BrainLL Network Persistence
//!
//! Saving and loading of networks, weights and learning state.
//!
//! ## Formats
//! - **JSON**: human-readable documents with `version` and `type` fields
//! - **Binary**: `BLNN` header (version, content type, FNV-1a checksum) followed by
//!   a bincode payload
//!
//! Both formats carry the same documents, see [`document`].
//!
//! ## Usage
//! ```ignore
//! use brainll_persistence::persistence_for_format;
//!
//! let persistence = persistence_for_format("binary")?;
//! persistence.save_network(&network, "brain.blnn".as_ref())?;
//! let network = persistence.load_network("brain.blnn".as_ref())?;
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use brainll_npu_engine::NetworkCore;
use tracing::info;

pub mod binary;
pub mod document;
pub mod error;
pub mod json;

pub use binary::BinaryPersistence;
pub use document::{
    ContentType, Document, LearningStateDocument, NetworkDocument, WeightsDocument,
    DOCUMENT_VERSION,
};
pub use error::{PersistenceError, Result};
pub use json::JsonPersistence;

/// On-disk format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistenceFormat {
    Json,
    Binary,
}

impl PersistenceFormat {
    /// Accepts `json` and `binary` (also `bin`, `blnn`), case-insensitive
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "binary" | "bin" | "blnn" => Some(Self::Binary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "binary",
        }
    }

    /// Guess the format of an existing file from its first bytes
    pub fn detect(path: &Path) -> Result<Self> {
        let mut magic = [0u8; 4];
        let mut file = File::open(path)?;
        let read = file.read(&mut magic)?;
        if read == magic.len() && &magic == binary::MAGIC {
            Ok(Self::Binary)
        } else {
            Ok(Self::Json)
        }
    }
}

impl fmt::Display for PersistenceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A persistence backend.
///
/// Implementors provide document I/O; saving and loading of networks, weights and
/// learning state are built on top of it.
pub trait NetworkPersistence: Send + Sync {
    fn format(&self) -> PersistenceFormat;

    fn write_document(&self, document: &Document, path: &Path) -> Result<()>;

    /// Read a document, failing unless it holds `expected` content
    fn read_document(&self, path: &Path, expected: ContentType) -> Result<Document>;

    fn save_network(&self, network: &NetworkCore, path: &Path) -> Result<()> {
        self.write_document(&Document::Network(NetworkDocument::capture(network)), path)?;
        info!(
            "[PERSISTENCE] Saved network ({} neurons, {} connections) to {} as {}",
            network.neuron_count(),
            network.connection_count(),
            path.display(),
            self.format()
        );
        Ok(())
    }

    fn load_network(&self, path: &Path) -> Result<NetworkCore> {
        match self.read_document(path, ContentType::Network)? {
            Document::Network(document) => {
                let network = document.into_network()?;
                info!(
                    "[PERSISTENCE] Loaded network ({} neurons, {} connections) from {}",
                    network.neuron_count(),
                    network.connection_count(),
                    path.display()
                );
                Ok(network)
            }
            other => Err(mismatch(ContentType::Network, &other)),
        }
    }

    fn save_weights(&self, network: &NetworkCore, path: &Path) -> Result<()> {
        self.write_document(&Document::Weights(WeightsDocument::capture(network)), path)?;
        info!(
            "[PERSISTENCE] Saved {} weights to {}",
            network.connection_count(),
            path.display()
        );
        Ok(())
    }

    /// Overwrite the weights of matching connections; returns how many were applied
    fn load_weights(&self, network: &mut NetworkCore, path: &Path) -> Result<usize> {
        match self.read_document(path, ContentType::Weights)? {
            Document::Weights(document) => {
                let applied = document.apply(network);
                info!(
                    "[PERSISTENCE] Applied {}/{} weights from {}",
                    applied,
                    document.weights.len(),
                    path.display()
                );
                Ok(applied)
            }
            other => Err(mismatch(ContentType::Weights, &other)),
        }
    }

    fn save_learning_state(&self, network: &NetworkCore, path: &Path) -> Result<()> {
        self.write_document(
            &Document::LearningState(LearningStateDocument::capture(network)),
            path,
        )?;
        info!("[PERSISTENCE] Saved learning state to {}", path.display());
        Ok(())
    }

    /// Restore weights, plasticity state and thresholds; returns how many records were applied
    fn load_learning_state(&self, network: &mut NetworkCore, path: &Path) -> Result<usize> {
        match self.read_document(path, ContentType::LearningState)? {
            Document::LearningState(document) => {
                let applied = document.apply(network);
                info!(
                    "[PERSISTENCE] Applied {} learning-state records from {}",
                    applied,
                    path.display()
                );
                Ok(applied)
            }
            other => Err(mismatch(ContentType::LearningState, &other)),
        }
    }
}

fn mismatch(expected: ContentType, found: &Document) -> PersistenceError {
    PersistenceError::ContentTypeMismatch {
        expected,
        found: found.content_type(),
    }
}

pub fn persistence_for(format: PersistenceFormat) -> Box<dyn NetworkPersistence> {
    match format {
        PersistenceFormat::Json => Box::new(JsonPersistence::new()),
        PersistenceFormat::Binary => Box::new(BinaryPersistence::new()),
    }
}

/// Backend for a format name (`json` or `binary`)
pub fn persistence_for_format(name: &str) -> Result<Box<dyn NetworkPersistence>> {
    PersistenceFormat::parse(name)
        .map(persistence_for)
        .ok_or_else(|| PersistenceError::UnknownFormat(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(PersistenceFormat::parse("JSON"), Some(PersistenceFormat::Json));
        assert_eq!(PersistenceFormat::parse("blnn"), Some(PersistenceFormat::Binary));
        assert_eq!(PersistenceFormat::parse("yaml"), None);
        assert!(matches!(
            persistence_for_format("xml"),
            Err(PersistenceError::UnknownFormat(name)) if name == "xml"
        ));
        assert_eq!(
            persistence_for_format("binary").unwrap().format(),
            PersistenceFormat::Binary
        );
    }

    #[test]
    fn test_detect_format() {
        let dir = tempfile::tempdir().unwrap();
        let network = NetworkCore::default();
        for format in [PersistenceFormat::Json, PersistenceFormat::Binary] {
            let path = dir.path().join(format!("net.{}", format));
            persistence_for(format).save_network(&network, &path).unwrap();
            assert_eq!(PersistenceFormat::detect(&path).unwrap(), format);
        }
    }
}
