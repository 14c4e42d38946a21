// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Gate-based neuron variants
//!
//! These are fixed nonlinear transfer functions with memory, not trained layers.
//! The gate weights are the per-instance `input_weight` and `recurrent_weight`
//! parameters; nothing here is learned. The potential of a recurrent neuron is its
//! current output activation and it fires when that activation is strictly above
//! `threshold`. Firing does not reset the activation.
//!
//! All variants leave their state untouched on a step with no buffered input.

use rand::rngs::StdRng;
use rand::Rng;

use super::kind::NeuronModelKind;
use super::params::NeuronParameters;
use super::traits::{ModelState, NeuronModel};

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Weighted input drive, or `None` when nothing arrived this step
#[inline]
fn drive(inputs: &[f64], params: &NeuronParameters) -> Option<f64> {
    if inputs.is_empty() {
        None
    } else {
        Some(params.input_weight * inputs.iter().sum::<f64>())
    }
}

#[inline]
fn dropped(rng: &mut StdRng, dropout: f64) -> bool {
    dropout > 0.0 && rng.gen::<f64>() < dropout
}

// The shared trait methods for every gate-based variant
macro_rules! recurrent_common {
    () => {
        fn should_fire(&self, potential: f64, params: &NeuronParameters) -> bool {
            potential > params.threshold
        }

        fn reset_after_fire(&mut self, potential: f64, _params: &NeuronParameters) -> f64 {
            potential
        }

        fn initial_potential(&self, _params: &NeuronParameters) -> f64 {
            0.0
        }

        fn apply_impulse(
            &mut self,
            potential: f64,
            weight: f64,
            params: &NeuronParameters,
            rng: &mut StdRng,
        ) -> f64 {
            self.integrate(potential, &[weight], params, 0.0, rng)
                .unwrap_or(potential)
        }

        fn box_clone(&self) -> Box<dyn NeuronModel> {
            Box::new(self.clone())
        }
    };
}

/// Scalar LSTM cell
#[derive(Debug, Clone, Default)]
pub struct LstmModel {
    cell: f64,
    hidden: f64,
}

impl NeuronModel for LstmModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::Lstm
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        let s = drive(inputs, params)? + params.recurrent_weight * self.hidden;
        let forget = sigmoid(s + params.forget_bias);
        let input = sigmoid(s);
        let output = sigmoid(s);
        let candidate = s.tanh();
        self.cell = forget * self.cell + input * candidate;
        self.hidden = output * self.cell.tanh();
        Some(self.hidden)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.cell = 0.0;
        self.hidden = 0.0;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            cell_state: vec![self.cell],
            hidden_state: vec![self.hidden],
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.cell = state.cell_state.first().copied().unwrap_or(0.0);
        self.hidden = state.hidden_state.first().copied().unwrap_or(0.0);
    }

    recurrent_common!();
}

/// Scalar GRU cell
#[derive(Debug, Clone, Default)]
pub struct GruModel {
    hidden: f64,
}

impl NeuronModel for GruModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::Gru
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        let s = drive(inputs, params)?;
        let h = params.recurrent_weight * self.hidden;
        let reset = sigmoid(s + h);
        let update = sigmoid(s + h);
        let candidate = (s + reset * h).tanh();
        self.hidden = (1.0 - update) * self.hidden + update * candidate;
        Some(self.hidden)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.hidden = 0.0;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            hidden_state: vec![self.hidden],
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.hidden = state.hidden_state.first().copied().unwrap_or(0.0);
    }

    recurrent_common!();
}

/// Softmax attention over the individual inputs of one step
#[derive(Debug, Clone, Default)]
pub struct TransformerModel {
    last_output: f64,
}

impl NeuronModel for TransformerModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::Transformer
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        _rng: &mut StdRng,
    ) -> Option<f64> {
        if inputs.is_empty() {
            return None;
        }
        let values: Vec<f64> = inputs.iter().map(|x| params.input_weight * x).collect();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        let output = values
            .iter()
            .zip(&exps)
            .map(|(v, e)| v * e / total)
            .sum::<f64>();
        self.last_output = output;
        Some(output)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.last_output = 0.0;
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            hidden_state: vec![self.last_output],
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.last_output = state.hidden_state.first().copied().unwrap_or(0.0);
    }

    recurrent_common!();
}

/// Vector LSTM with dropout on the cell update
#[derive(Debug, Clone, Default)]
pub struct MemoryCellModel {
    cell: Vec<f64>,
    hidden: Vec<f64>,
}

impl MemoryCellModel {
    fn ensure_size(&mut self, size: usize) {
        if self.cell.len() != size {
            self.cell.resize(size, 0.0);
            self.hidden.resize(size, 0.0);
        }
    }
}

impl NeuronModel for MemoryCellModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::MemoryCell
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        rng: &mut StdRng,
    ) -> Option<f64> {
        let s = drive(inputs, params)?;
        self.ensure_size(params.hidden_size.max(1));

        for (c, h) in self.cell.iter_mut().zip(self.hidden.iter_mut()) {
            let x = s + params.recurrent_weight * *h;
            let forget = sigmoid(x + params.forget_bias);
            let gate = sigmoid(x);
            let candidate = if dropped(rng, params.dropout) {
                0.0
            } else {
                gate * x.tanh()
            };
            *c = forget * *c + candidate;
            *h = gate * c.tanh();
        }

        Some(self.hidden.iter().sum::<f64>() / self.hidden.len() as f64)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.cell.clear();
        self.hidden.clear();
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            cell_state: self.cell.clone(),
            hidden_state: self.hidden.clone(),
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.cell = state.cell_state.clone();
        self.hidden = state.hidden_state.clone();
        let size = self.cell.len().max(self.hidden.len());
        self.ensure_size(size);
    }

    recurrent_common!();
}

/// Multi-head scaled dot-product gate
#[derive(Debug, Clone, Default)]
pub struct AttentionUnitModel {
    heads: Vec<f64>,
}

impl NeuronModel for AttentionUnitModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::AttentionUnit
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        rng: &mut StdRng,
    ) -> Option<f64> {
        let s = drive(inputs, params)?;
        let head_count = params.attention_heads.max(1);
        let scale = params.key_dim.sqrt();

        self.heads.clear();
        for head in 0..head_count {
            if dropped(rng, params.dropout) {
                self.heads.push(0.0);
                continue;
            }
            let query = s * (head + 1) as f64 / head_count as f64;
            let score = query * s / scale;
            self.heads.push(sigmoid(score) * s);
        }

        Some(self.heads.iter().sum::<f64>() / head_count as f64)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.heads.clear();
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            hidden_state: self.heads.clone(),
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.heads = state.hidden_state.clone();
    }

    recurrent_common!();
}

/// Vector GRU with a stabilising blend and a front-weighted readout
#[derive(Debug, Clone, Default)]
pub struct ExecutiveControllerModel {
    hidden: Vec<f64>,
}

impl NeuronModel for ExecutiveControllerModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::ExecutiveController
    }

    fn integrate(
        &mut self,
        _potential: f64,
        inputs: &[f64],
        params: &NeuronParameters,
        _dt: f64,
        rng: &mut StdRng,
    ) -> Option<f64> {
        let s = drive(inputs, params)?;
        let size = params.hidden_size.max(1);
        if self.hidden.len() != size {
            self.hidden.resize(size, 0.0);
        }

        let stable = s.tanh();
        for h in self.hidden.iter_mut() {
            if dropped(rng, params.dropout) {
                continue;
            }
            let recurrent = params.recurrent_weight * *h;
            let update = sigmoid(s + 1.2 * recurrent);
            let reset = sigmoid(s + recurrent);
            let candidate = (s + reset * recurrent).tanh();
            let gated = (1.0 - update) * *h + update * candidate;
            *h = 0.95 * gated + 0.05 * stable;
        }

        let half = size / 2;
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (i, h) in self.hidden.iter().enumerate() {
            let w = if i < half { 1.2 } else { 0.8 };
            weighted += w * h;
            total_weight += w;
        }
        Some(weighted / total_weight)
    }

    fn reset_state(&mut self, _params: &NeuronParameters) {
        self.hidden.clear();
    }

    fn export_state(&self) -> ModelState {
        ModelState {
            hidden_state: self.hidden.clone(),
            ..ModelState::default()
        }
    }

    fn import_state(&mut self, state: &ModelState) {
        self.hidden = state.hidden_state.clone();
    }

    recurrent_common!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_no_input_leaves_state_untouched() {
        let params = NeuronParameters::for_model(NeuronModelKind::Lstm);
        let mut model = LstmModel::default();
        model.integrate(0.0, &[1.0], &params, 1.0, &mut rng());
        let before = model.export_state();
        assert_eq!(model.integrate(0.3, &[], &params, 1.0, &mut rng()), None);
        assert_eq!(model.export_state(), before);
    }

    #[test]
    fn test_lstm_strong_input_crosses_threshold() {
        let params = NeuronParameters::for_model(NeuronModelKind::Lstm);
        let mut model = LstmModel::default();
        let h = model.integrate(0.0, &[5.0], &params, 1.0, &mut rng()).unwrap();

        let f = sigmoid(6.0);
        let g = sigmoid(5.0);
        let c = g * 5.0f64.tanh();
        assert!(f > g);
        assert!((h - g * c.tanh()).abs() < 1e-12);
        assert!(model.should_fire(h, &params));
    }

    #[test]
    fn test_gru_first_step() {
        let params = NeuronParameters::for_model(NeuronModelKind::Gru);
        let mut model = GruModel::default();
        let h = model.integrate(0.0, &[2.0], &params, 1.0, &mut rng()).unwrap();
        let z = sigmoid(2.0);
        assert!((h - z * 2.0f64.tanh()).abs() < 1e-12);
        assert!(h > 0.5);
    }

    #[test]
    fn test_transformer_softmax_weighting() {
        let params = NeuronParameters::for_model(NeuronModelKind::Transformer);
        let mut model = TransformerModel::default();
        let out = model.integrate(0.0, &[1.0, 3.0], &params, 1.0, &mut rng()).unwrap();
        let e1 = 1.0f64.exp();
        let e3 = 3.0f64.exp();
        let expected = (1.0 * e1 + 3.0 * e3) / (e1 + e3);
        assert!((out - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transformer_is_stable_for_large_inputs() {
        let params = NeuronParameters::for_model(NeuronModelKind::Transformer);
        let mut model = TransformerModel::default();
        let out = model.integrate(0.0, &[1000.0, 999.0], &params, 1.0, &mut rng()).unwrap();
        assert!(out.is_finite());
    }

    #[test]
    fn test_threshold_is_strict() {
        let params = NeuronParameters::for_model(NeuronModelKind::Gru);
        let model = GruModel::default();
        assert!(!model.should_fire(0.5, &params));
        assert!(model.should_fire(0.5001, &params));
    }

    #[test]
    fn test_memory_cell_sizes_state_to_hidden_size() {
        let mut params = NeuronParameters::for_model(NeuronModelKind::MemoryCell);
        params.dropout = 0.0;
        let mut model = MemoryCellModel::default();
        model.integrate(0.0, &[1.0], &params, 1.0, &mut rng());
        let state = model.export_state();
        assert_eq!(state.cell_state.len(), 256);
        assert_eq!(state.hidden_state.len(), 256);
    }

    #[test]
    fn test_memory_cell_dropout_is_seeded() {
        let params = NeuronParameters::for_model(NeuronModelKind::MemoryCell);
        let mut a = MemoryCellModel::default();
        let mut b = MemoryCellModel::default();
        let out_a = a.integrate(0.0, &[2.0], &params, 1.0, &mut rng());
        let out_b = b.integrate(0.0, &[2.0], &params, 1.0, &mut rng());
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_attention_unit_without_dropout() {
        let mut params = NeuronParameters::for_model(NeuronModelKind::AttentionUnit);
        params.dropout = 0.0;
        let mut model = AttentionUnitModel::default();
        let out = model.integrate(0.0, &[2.0], &params, 1.0, &mut rng()).unwrap();
        assert_eq!(model.export_state().hidden_state.len(), 12);
        assert!(out > 0.0 && out < 2.0);
    }

    #[test]
    fn test_executive_controller_fires_above_lower_threshold() {
        let mut params = NeuronParameters::for_model(NeuronModelKind::ExecutiveController);
        params.dropout = 0.0;
        let mut model = ExecutiveControllerModel::default();
        let out = model.integrate(0.0, &[3.0], &params, 1.0, &mut rng()).unwrap();
        assert!(out > 0.3);
        assert!(model.should_fire(out, &params));
    }

    #[test]
    fn test_firing_does_not_reset_activation() {
        let params = NeuronParameters::for_model(NeuronModelKind::Lstm);
        let mut model = LstmModel::default();
        assert_eq!(model.reset_after_fire(0.8, &params), 0.8);
    }

    #[test]
    fn test_impulse_integrates_single_input() {
        let params = NeuronParameters::for_model(NeuronModelKind::Gru);
        let mut model = GruModel::default();
        let v = model.apply_impulse(0.0, 2.0, &params, &mut rng());
        assert!((v - sigmoid(2.0) * 2.0f64.tanh()).abs() < 1e-12);
    }
}
