// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Neuron model tags and name parsing

use core::fmt;
use serde::{Deserialize, Serialize};

/// Which update equations a neuron follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronModelKind {
    #[default]
    #[serde(rename = "LIF")]
    Lif,
    #[serde(rename = "AdaptiveLIF")]
    AdaptiveLif,
    #[serde(rename = "Izhikevich")]
    Izhikevich,
    #[serde(rename = "HighResolutionLIF")]
    HighResolutionLif,
    #[serde(rename = "FastSpiking")]
    FastSpiking,
    #[serde(rename = "RegularSpiking")]
    RegularSpiking,
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "GRU")]
    Gru,
    #[serde(rename = "Transformer")]
    Transformer,
    #[serde(rename = "MemoryCell")]
    MemoryCell,
    #[serde(rename = "AttentionUnit")]
    AttentionUnit,
    #[serde(rename = "ExecutiveController")]
    ExecutiveController,
}

impl NeuronModelKind {
    pub const ALL: [NeuronModelKind; 12] = [
        NeuronModelKind::Lif,
        NeuronModelKind::AdaptiveLif,
        NeuronModelKind::Izhikevich,
        NeuronModelKind::HighResolutionLif,
        NeuronModelKind::FastSpiking,
        NeuronModelKind::RegularSpiking,
        NeuronModelKind::Lstm,
        NeuronModelKind::Gru,
        NeuronModelKind::Transformer,
        NeuronModelKind::MemoryCell,
        NeuronModelKind::AttentionUnit,
        NeuronModelKind::ExecutiveController,
    ];

    /// Parse a model name. Accepts the canonical name and its snake_case alias.
    /// Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "LIF" | "lif" => NeuronModelKind::Lif,
            "AdaptiveLIF" | "adaptive_lif" => NeuronModelKind::AdaptiveLif,
            "Izhikevich" | "izhikevich" => NeuronModelKind::Izhikevich,
            "HighResolutionLIF" | "high_resolution_lif" => NeuronModelKind::HighResolutionLif,
            "FastSpiking" | "fast_spiking" => NeuronModelKind::FastSpiking,
            "RegularSpiking" | "regular_spiking" => NeuronModelKind::RegularSpiking,
            "LSTM" | "lstm" => NeuronModelKind::Lstm,
            "GRU" | "gru" => NeuronModelKind::Gru,
            "Transformer" | "transformer" => NeuronModelKind::Transformer,
            "MemoryCell" | "memory_cell" => NeuronModelKind::MemoryCell,
            "AttentionUnit" | "attention_unit" => NeuronModelKind::AttentionUnit,
            "ExecutiveController" | "executive_controller" => NeuronModelKind::ExecutiveController,
            _ => return None,
        };
        Some(kind)
    }

    /// Parse a model name, falling back to LIF for anything unrecognised
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::debug!("[NEURON] Unknown model '{}', falling back to LIF", name);
            NeuronModelKind::Lif
        })
    }

    /// Canonical display name
    pub fn name(self) -> &'static str {
        match self {
            NeuronModelKind::Lif => "LIF",
            NeuronModelKind::AdaptiveLif => "AdaptiveLIF",
            NeuronModelKind::Izhikevich => "Izhikevich",
            NeuronModelKind::HighResolutionLif => "HighResolutionLIF",
            NeuronModelKind::FastSpiking => "FastSpiking",
            NeuronModelKind::RegularSpiking => "RegularSpiking",
            NeuronModelKind::Lstm => "LSTM",
            NeuronModelKind::Gru => "GRU",
            NeuronModelKind::Transformer => "Transformer",
            NeuronModelKind::MemoryCell => "MemoryCell",
            NeuronModelKind::AttentionUnit => "AttentionUnit",
            NeuronModelKind::ExecutiveController => "ExecutiveController",
        }
    }

    /// Integrate-and-fire models with a membrane ODE
    pub fn is_lif_family(self) -> bool {
        matches!(
            self,
            NeuronModelKind::Lif | NeuronModelKind::AdaptiveLif | NeuronModelKind::HighResolutionLif
        )
    }

    pub fn is_izhikevich_family(self) -> bool {
        matches!(
            self,
            NeuronModelKind::Izhikevich
                | NeuronModelKind::FastSpiking
                | NeuronModelKind::RegularSpiking
        )
    }

    /// Gate-based cells whose potential is a bounded activation
    pub fn is_recurrent(self) -> bool {
        !self.is_lif_family() && !self.is_izhikevich_family()
    }
}

impl fmt::Display for NeuronModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
