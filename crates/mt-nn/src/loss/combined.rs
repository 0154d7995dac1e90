// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::Loss;
use crate::schedule::WeightSchedule;
use mt_tensor::{PureResult, StateBatch, TensorError};

/// Blends several losses into one training signal with progress-dependent
/// weights.
///
/// Every constituent loss scores the same batch; each score vector is reduced
/// to its mean and the results are dot-multiplied with the schedule output.
/// The first loss is treated as the diagnostic "log loss" and stays
/// accessible unreduced through [`CombinedLoss::log_loss`].
pub struct CombinedLoss {
    losses: Vec<Box<dyn Loss>>,
    schedule: Box<dyn WeightSchedule>,
}

impl CombinedLoss {
    pub fn new(
        losses: Vec<Box<dyn Loss>>,
        schedule: Box<dyn WeightSchedule>,
    ) -> PureResult<Self> {
        if losses.is_empty() {
            return Err(TensorError::EmptyInput("combined losses"));
        }
        Ok(Self { losses, schedule })
    }

    /// Number of constituent losses.
    pub fn len(&self) -> usize {
        self.losses.len()
    }

    /// Always false; the constructor rejects empty loss lists.
    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }

    /// Evaluates the weighted combination at the given point in training.
    pub fn evaluate_at(
        &mut self,
        state: &StateBatch,
        step: usize,
        epoch: usize,
        evolutions_per_image: usize,
    ) -> PureResult<f32> {
        let weights = self.schedule.weights(step, epoch, evolutions_per_image);
        if weights.len() != self.losses.len() {
            return Err(TensorError::DataLength {
                expected: self.losses.len(),
                got: weights.len(),
            });
        }
        let mut total = 0.0f32;
        for (loss, weight) in self.losses.iter_mut().zip(weights.iter()) {
            let scores = loss.evaluate(state)?;
            if scores.is_empty() {
                return Err(TensorError::EmptyInput("loss scores"));
            }
            let mean = scores.iter().sum::<f32>() / scores.len() as f32;
            if !mean.is_finite() {
                return Err(TensorError::NonFiniteValue {
                    label: "combined loss term",
                    value: mean,
                });
            }
            total += weight * mean;
        }
        Ok(total)
    }

    /// Unreduced per-image scores of the first loss, for diagnostic logging.
    pub fn log_loss(&mut self, state: &StateBatch) -> PureResult<Vec<f32>> {
        self.losses[0].evaluate(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ConstantWeights;

    struct Flat(f32);

    impl Loss for Flat {
        fn evaluate(&mut self, state: &StateBatch) -> PureResult<Vec<f32>> {
            Ok(vec![self.0; state.batch()])
        }
    }

    fn toy_state() -> StateBatch {
        StateBatch::zeros(3, 4, 4, 4).unwrap()
    }

    #[test]
    fn equal_weights_average_constant_losses() {
        let mut combined = CombinedLoss::new(
            vec![Box::new(Flat(1.0)), Box::new(Flat(2.0))],
            Box::new(ConstantWeights(vec![0.5, 0.5])),
        )
        .unwrap();
        let state = toy_state();
        for (step, epoch, k) in [(0, 0, 0), (17, 3, 8), (9999, 42, 1)] {
            let value = combined.evaluate_at(&state, step, epoch, k).unwrap();
            assert!((value - 1.5).abs() < 1e-6);
        }
    }

    #[test]
    fn schedule_shifts_the_blend_over_training() {
        let schedule = |step: usize, _epoch: usize, _k: usize| {
            if step < 100 {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            }
        };
        let mut combined = CombinedLoss::new(
            vec![Box::new(Flat(1.0)), Box::new(Flat(2.0))],
            Box::new(schedule),
        )
        .unwrap();
        let state = toy_state();
        assert!((combined.evaluate_at(&state, 0, 0, 0).unwrap() - 1.0).abs() < 1e-6);
        assert!((combined.evaluate_at(&state, 500, 0, 0).unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn log_loss_exposes_the_first_loss_unreduced() {
        let mut combined = CombinedLoss::new(
            vec![Box::new(Flat(0.25)), Box::new(Flat(9.0))],
            Box::new(ConstantWeights(vec![1.0, 0.0])),
        )
        .unwrap();
        let scores = combined.log_loss(&toy_state()).unwrap();
        assert_eq!(scores, vec![0.25, 0.25, 0.25]);
    }

    #[test]
    fn weight_vector_length_must_match() {
        let mut combined = CombinedLoss::new(
            vec![Box::new(Flat(1.0)), Box::new(Flat(2.0))],
            Box::new(ConstantWeights(vec![1.0])),
        )
        .unwrap();
        assert!(matches!(
            combined.evaluate_at(&toy_state(), 0, 0, 0),
            Err(TensorError::DataLength {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn empty_loss_list_is_rejected() {
        assert!(matches!(
            CombinedLoss::new(vec![], Box::new(ConstantWeights(vec![]))),
            Err(TensorError::EmptyInput(_))
        ));
    }
}
