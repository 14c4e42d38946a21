// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! Every neuron model is one struct implementing [`NeuronModel`]. A
//! [`NeuronModelKind`] tag selects the implementation through [`create_model`].
//!
//! ## Adding a New Neuron Model
//!
//! 1. Add a variant to `NeuronModelKind` (name, aliases, family)
//! 2. Give it defaults in `NeuronParameters::for_model`
//! 3. Implement `NeuronModel` in its own file
//! 4. Wire it into `create_model` and add tests

pub mod factory;
pub mod izhikevich;
pub mod kind;
pub mod lif;
pub mod params;
pub mod recurrent;
pub mod traits;

pub use factory::create_model;
pub use izhikevich::{IzhikevichModel, IzhikevichPreset};
pub use kind::NeuronModelKind;
pub use lif::{AdaptiveLifModel, HighResolutionLifModel, LifModel};
pub use params::{NeuronParameters, ParameterMap, PARAMETER_NAMES};
pub use recurrent::{
    AttentionUnitModel, ExecutiveControllerModel, GruModel, LstmModel, MemoryCellModel,
    TransformerModel,
};
pub use traits::{ModelParameters, ModelState, NeuronModel};
