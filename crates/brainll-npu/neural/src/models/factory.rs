// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Model construction keyed by [`NeuronModelKind`]

use super::izhikevich::IzhikevichModel;
use super::kind::NeuronModelKind;
use super::lif::{AdaptiveLifModel, HighResolutionLifModel, LifModel};
use super::params::NeuronParameters;
use super::recurrent::{
    AttentionUnitModel, ExecutiveControllerModel, GruModel, LstmModel, MemoryCellModel,
    TransformerModel,
};
use super::traits::NeuronModel;

/// Build a fresh model instance with its auxiliary state initialised from `params`
pub fn create_model(kind: NeuronModelKind, params: &NeuronParameters) -> Box<dyn NeuronModel> {
    match kind {
        NeuronModelKind::Lif => Box::new(LifModel::new()),
        NeuronModelKind::AdaptiveLif => Box::new(AdaptiveLifModel::new()),
        NeuronModelKind::HighResolutionLif => Box::new(HighResolutionLifModel::new()),
        NeuronModelKind::Izhikevich
        | NeuronModelKind::RegularSpiking
        | NeuronModelKind::FastSpiking => Box::new(IzhikevichModel::new(kind, params)),
        NeuronModelKind::Lstm => Box::new(LstmModel::default()),
        NeuronModelKind::Gru => Box::new(GruModel::default()),
        NeuronModelKind::Transformer => Box::new(TransformerModel::default()),
        NeuronModelKind::MemoryCell => Box::new(MemoryCellModel::default()),
        NeuronModelKind::AttentionUnit => Box::new(AttentionUnitModel::default()),
        NeuronModelKind::ExecutiveController => Box::new(ExecutiveControllerModel::default()),
    }
}
