// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::Loss;
use crate::module::CaModel;
use mt_tensor::{PureResult, StateBatch, TensorError};
use std::sync::Arc;

/// Penalizes two update rules for drifting apart in parameter space.
///
/// The score is `scale * mse(params1, params2)` read at call time, so it
/// tracks the models as they train. The state batch is ignored; the loss is
/// constant across images and returns a single-element vector.
pub struct ParameterDistance {
    model1: Arc<dyn CaModel>,
    model2: Arc<dyn CaModel>,
    scale: f32,
}

impl ParameterDistance {
    pub fn new(model1: Arc<dyn CaModel>, model2: Arc<dyn CaModel>, scale: f32) -> Self {
        Self {
            model1,
            model2,
            scale,
        }
    }
}

impl Loss for ParameterDistance {
    fn evaluate(&mut self, _state: &StateBatch) -> PureResult<Vec<f32>> {
        let p1 = self.model1.parameters();
        let p2 = self.model2.parameters();
        if p1.is_empty() {
            return Err(TensorError::EmptyInput("model parameters"));
        }
        if p1.len() != p2.len() {
            return Err(TensorError::DataLength {
                expected: p1.len(),
                got: p2.len(),
            });
        }
        let mut sum = 0.0f32;
        for (a, b) in p1.iter().zip(p2.iter()) {
            let diff = a - b;
            sum += diff * diff;
        }
        Ok(vec![self.scale * sum / p1.len() as f32])
    }
}
