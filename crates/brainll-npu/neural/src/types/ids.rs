// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identity types for neurons and connections
//!
//! IDs are allocated from 1 upward by the network and never reused. The value 0
//! is reserved as the "invalid" sentinel returned by failed creation calls.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Neuron ID (unique within one network)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeuronId(pub u32);

impl NeuronId {
    /// Sentinel for "no such neuron"
    pub const INVALID: NeuronId = NeuronId(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Neuron({})", self.0)
    }
}

/// Connection ID (unique identifier for a synaptic connection)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    /// Sentinel for "no such connection"
    pub const INVALID: ConnectionId = ConnectionId(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinels() {
        assert!(!NeuronId::INVALID.is_valid());
        assert!(!ConnectionId::INVALID.is_valid());
        assert!(NeuronId(1).is_valid());
        assert!(ConnectionId(7).is_valid());
    }

    #[test]
    fn test_display() {
        assert_eq!(NeuronId(3).to_string(), "Neuron(3)");
        assert_eq!(ConnectionId(12).to_string(), "Connection(12)");
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&NeuronId(42)).unwrap();
        assert_eq!(json, "42");
        let back: ConnectionId = serde_json::from_str("9").unwrap();
        assert_eq!(back, ConnectionId(9));
    }
}
