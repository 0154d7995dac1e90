// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Curriculum weighting for combined losses.
//!
//! A [`WeightSchedule`] maps training progress to one weight per constituent
//! loss, so a stability penalty can be phased in while the reconstruction
//! term dominates the early epochs. Schedules are plain values injected at
//! construction; closures implement the trait directly.

/// Progress-dependent weight vector, one entry per combined loss.
pub trait WeightSchedule {
    /// Returns the weights for the given step, epoch, and number of
    /// evolutions already applied to each image.
    fn weights(&self, step: usize, epoch: usize, evolutions_per_image: usize) -> Vec<f32>;
}

impl<F> WeightSchedule for F
where
    F: Fn(usize, usize, usize) -> Vec<f32>,
{
    fn weights(&self, step: usize, epoch: usize, evolutions_per_image: usize) -> Vec<f32> {
        self(step, epoch, evolutions_per_image)
    }
}

/// Progress-independent weights.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantWeights(pub Vec<f32>);

impl WeightSchedule for ConstantWeights {
    fn weights(&self, _step: usize, _epoch: usize, _evolutions_per_image: usize) -> Vec<f32> {
        self.0.clone()
    }
}

/// Linearly ramps one weight slot from `start` to `end` over `steps` training
/// steps while the remaining slots stay at their base value.
#[derive(Clone, Debug, PartialEq)]
pub struct RampWeights {
    base: Vec<f32>,
    slot: usize,
    start: f32,
    end: f32,
    steps: usize,
}

impl RampWeights {
    pub fn new(base: Vec<f32>, slot: usize, start: f32, end: f32, steps: usize) -> Self {
        Self {
            base,
            slot,
            start,
            end,
            steps: steps.max(1),
        }
    }
}

impl WeightSchedule for RampWeights {
    fn weights(&self, step: usize, _epoch: usize, _evolutions_per_image: usize) -> Vec<f32> {
        let mut weights = self.base.clone();
        if let Some(value) = weights.get_mut(self.slot) {
            let progress = (step as f32 / self.steps as f32).clamp(0.0, 1.0);
            *value = self.start + (self.end - self.start) * progress;
        }
        weights
    }
}
