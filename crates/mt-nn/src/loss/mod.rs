// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

mod cell_ratio;
mod combined;
mod model_distance;
mod nca_loss;

use mt_tensor::{PureResult, StateBatch};

pub use cell_ratio::CellRatioLoss;
pub use combined::CombinedLoss;
pub use model_distance::ParameterDistance;
pub use nca_loss::{Criterion, NcaLoss};

/// Trait implemented by everything that can score an evolved state batch.
///
/// Scores come back per image; callers that need a scalar take the mean. A
/// loss that is constant across the batch (such as a parameter penalty) may
/// return a single-element vector.
pub trait Loss {
    /// Scores the batch against whatever target the loss carries.
    fn evaluate(&mut self, state: &StateBatch) -> PureResult<Vec<f32>>;
}
