// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::Loss;
use mt_tensor::{PureResult, StateBatch};

/// Fraction of living mass still held by the original automaton.
///
/// For each image the score is `orig / (orig + virus + 1e-8)`: close to one
/// while the original resists the infection, zero once the virus has taken
/// every cell. The stabilizer keeps empty images at zero instead of NaN.
pub struct CellRatioLoss {
    original_channel: i64,
    virus_channel: i64,
}

impl CellRatioLoss {
    pub fn new(original_channel: i64, virus_channel: i64) -> Self {
        Self {
            original_channel,
            virus_channel,
        }
    }
}

impl Loss for CellRatioLoss {
    fn evaluate(&mut self, state: &StateBatch) -> PureResult<Vec<f32>> {
        let original = state.resolve_channel(self.original_channel)?;
        let virus = state.resolve_channel(self.virus_channel)?;
        let scores = (0..state.batch())
            .map(|image| {
                let original_mass = state.plane_sum(image, original);
                let virus_mass = state.plane_sum(image, virus);
                original_mass / (original_mass + virus_mass + 1e-8)
            })
            .collect();
        Ok(scores)
    }
}
