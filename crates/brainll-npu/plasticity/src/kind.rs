// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Plasticity rule tags

use core::fmt;
use serde::{Deserialize, Serialize};

/// Which learning rule a connection follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlasticityRuleKind {
    #[default]
    None,
    Stdp,
    Bcm,
    Homeostatic,
    Reinforcement,
    Hebbian,
    AntiHebbian,
    TripletStdp,
    VoltageDependent,
    Custom,
}

impl PlasticityRuleKind {
    pub const ALL: [PlasticityRuleKind; 10] = [
        PlasticityRuleKind::None,
        PlasticityRuleKind::Stdp,
        PlasticityRuleKind::Bcm,
        PlasticityRuleKind::Homeostatic,
        PlasticityRuleKind::Reinforcement,
        PlasticityRuleKind::Hebbian,
        PlasticityRuleKind::AntiHebbian,
        PlasticityRuleKind::TripletStdp,
        PlasticityRuleKind::VoltageDependent,
        PlasticityRuleKind::Custom,
    ];

    /// Parse a rule name, case-insensitively. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        let normalised = name.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        let kind = match normalised.as_str() {
            "NONE" | "" => PlasticityRuleKind::None,
            "STDP" => PlasticityRuleKind::Stdp,
            "BCM" => PlasticityRuleKind::Bcm,
            "HOMEOSTATIC" | "SYNAPTIC_SCALING" => PlasticityRuleKind::Homeostatic,
            "REINFORCEMENT" => PlasticityRuleKind::Reinforcement,
            "HEBBIAN" => PlasticityRuleKind::Hebbian,
            "ANTI_HEBBIAN" | "ANTIHEBBIAN" => PlasticityRuleKind::AntiHebbian,
            "TRIPLET_STDP" => PlasticityRuleKind::TripletStdp,
            "VOLTAGE_DEPENDENT" => PlasticityRuleKind::VoltageDependent,
            "CUSTOM" => PlasticityRuleKind::Custom,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            PlasticityRuleKind::None => "NONE",
            PlasticityRuleKind::Stdp => "STDP",
            PlasticityRuleKind::Bcm => "BCM",
            PlasticityRuleKind::Homeostatic => "HOMEOSTATIC",
            PlasticityRuleKind::Reinforcement => "REINFORCEMENT",
            PlasticityRuleKind::Hebbian => "HEBBIAN",
            PlasticityRuleKind::AntiHebbian => "ANTI_HEBBIAN",
            PlasticityRuleKind::TripletStdp => "TRIPLET_STDP",
            PlasticityRuleKind::VoltageDependent => "VOLTAGE_DEPENDENT",
            PlasticityRuleKind::Custom => "CUSTOM",
        }
    }

    /// Rules that never change the weight
    pub fn is_static(self) -> bool {
        matches!(self, PlasticityRuleKind::None | PlasticityRuleKind::Custom)
    }
}

impl fmt::Display for PlasticityRuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
