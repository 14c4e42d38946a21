// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::document::{check_header, ContentType, Document};
use crate::error::{PersistenceError, Result};
use crate::{NetworkPersistence, PersistenceFormat};

/// Leading fields shared by every document
#[derive(Deserialize)]
struct DocumentHeader {
    version: u32,
    #[serde(rename = "type")]
    content: ContentType,
}

/// Reads and writes pretty-printed JSON documents
#[derive(Debug, Clone, Copy)]
pub struct JsonPersistence {
    pretty: bool,
}

impl Default for JsonPersistence {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-line output
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn to_string(&self, document: &Document) -> Result<String> {
        let result = match (document, self.pretty) {
            (Document::Network(d), true) => serde_json::to_string_pretty(d),
            (Document::Network(d), false) => serde_json::to_string(d),
            (Document::Weights(d), true) => serde_json::to_string_pretty(d),
            (Document::Weights(d), false) => serde_json::to_string(d),
            (Document::LearningState(d), true) => serde_json::to_string_pretty(d),
            (Document::LearningState(d), false) => serde_json::to_string(d),
        };
        result.map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    /// Parse a document, checking version and type before the body
    pub fn from_str(text: &str, expected: ContentType) -> Result<Document> {
        let header: DocumentHeader = serde_json::from_str(text)
            .map_err(|e| PersistenceError::Deserialization(format!("header: {}", e)))?;
        check_header(header.version, header.content, expected)?;

        let document = match expected {
            ContentType::Network => serde_json::from_str(text).map(Document::Network),
            ContentType::Weights => serde_json::from_str(text).map(Document::Weights),
            ContentType::LearningState => serde_json::from_str(text).map(Document::LearningState),
        };
        document.map_err(|e| PersistenceError::Deserialization(e.to_string()))
    }
}

impl NetworkPersistence for JsonPersistence {
    fn format(&self) -> PersistenceFormat {
        PersistenceFormat::Json
    }

    fn write_document(&self, document: &Document, path: &Path) -> Result<()> {
        fs::write(path, self.to_string(document)?)?;
        Ok(())
    }

    fn read_document(&self, path: &Path, expected: ContentType) -> Result<Document> {
        let text = fs::read_to_string(path)?;
        Self::from_str(&text, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NetworkDocument;
    use brainll_npu_engine::NetworkCore;
    use brainll_npu_neural::{NeuronModelKind, ParameterMap};
    use brainll_npu_plasticity::PlasticityRuleKind;

    fn network_document() -> Document {
        let mut net = NetworkCore::default();
        let a = net.add_neuron(NeuronModelKind::Izhikevich, &ParameterMap::new());
        let b = net.add_neuron(NeuronModelKind::Gru, &ParameterMap::new());
        net.add_connection(a, b, 0.5, PlasticityRuleKind::TripletStdp);
        Document::Network(NetworkDocument::capture(&net))
    }

    #[test]
    fn test_type_field_names_content() {
        let text = JsonPersistence::compact()
            .to_string(&network_document())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "network");
        assert_eq!(value["version"], 1);
        assert_eq!(value["neurons"][0]["model"], "Izhikevich");
        assert_eq!(value["connections"][0]["rule"], "TRIPLET_STDP");
    }

    #[test]
    fn test_from_str_checks_header_first() {
        let text = JsonPersistence::new().to_string(&network_document()).unwrap();
        assert!(matches!(
            JsonPersistence::from_str(&text, ContentType::Weights),
            Err(PersistenceError::ContentTypeMismatch {
                expected: ContentType::Weights,
                found: ContentType::Network
            })
        ));

        let future = text.replacen("\"version\": 1", "\"version\": 2", 1);
        assert!(matches!(
            JsonPersistence::from_str(&future, ContentType::Network),
            Err(PersistenceError::UnsupportedVersion { found: 2, .. })
        ));

        assert!(matches!(
            JsonPersistence::from_str("{\"type\": \"network\"}", ContentType::Network),
            Err(PersistenceError::Deserialization(_))
        ));
    }

    #[test]
    fn test_from_str_returns_document() {
        let document = network_document();
        let text = JsonPersistence::new().to_string(&document).unwrap();
        assert_eq!(
            JsonPersistence::from_str(&text, ContentType::Network).unwrap(),
            document
        );
    }
}
