// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use super::Loss;
use mt_tensor::{PureResult, StateBatch, TensorError};
use rayon::prelude::*;

/// Elementwise distance applied between the composited prediction and the
/// target image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Criterion {
    /// Squared error, the usual choice.
    #[default]
    Mse,
    /// Absolute error, more forgiving of outlier pixels.
    Mae,
}

impl Criterion {
    #[inline]
    fn distance(&self, prediction: f32, target: f32) -> f32 {
        let diff = prediction - target;
        match self {
            Criterion::Mse => diff * diff,
            Criterion::Mae => diff.abs(),
        }
    }
}

/// Image-reconstruction loss for the neural CA.
///
/// The evolved state is composited down to four channels — RGB plus a
/// synthesized alpha that *sums* every configured alpha channel, so competing
/// automata jointly account for coverage — and compared against a stored
/// RGBA target. Scores are averaged over channel, height, and width but not
/// over the batch, so the caller can still find the worst image.
pub struct NcaLoss {
    target: StateBatch,
    criterion: Criterion,
    alpha_channels: Vec<i64>,
}

impl NcaLoss {
    /// Stores a detached copy of the RGBA target.
    pub fn new(
        target: StateBatch,
        criterion: Criterion,
        alpha_channels: Vec<i64>,
    ) -> PureResult<Self> {
        if target.channels() != 4 {
            return Err(TensorError::ChannelOutOfRange {
                channel: 4,
                channels: target.channels(),
            });
        }
        if alpha_channels.is_empty() {
            return Err(TensorError::EmptyInput("nca_loss alpha_channels"));
        }
        Ok(Self {
            target,
            criterion,
            alpha_channels,
        })
    }

    fn target_image(&self, image: usize, batch: usize) -> PureResult<usize> {
        if self.target.batch() == batch {
            Ok(image)
        } else if self.target.batch() == 1 {
            Ok(0)
        } else {
            Err(TensorError::ShapeMismatch {
                left: self.target.shape(),
                right: (batch, 4, self.target.height(), self.target.width()),
            })
        }
    }
}

impl Loss for NcaLoss {
    fn evaluate(&mut self, state: &StateBatch) -> PureResult<Vec<f32>> {
        let (batch, _, height, width) = state.shape();
        if height != self.target.height() || width != self.target.width() {
            return Err(TensorError::ShapeMismatch {
                left: self.target.shape(),
                right: state.shape(),
            });
        }
        let alphas = self
            .alpha_channels
            .iter()
            .map(|&channel| state.resolve_channel(channel))
            .collect::<PureResult<Vec<_>>>()?;
        // The composite needs the three RGB planes to exist.
        state.resolve_channel(2)?;

        let plane = height * width;
        let scores = (0..batch)
            .into_par_iter()
            .map(|image| {
                let target_image = self.target_image(image, batch)?;
                let mut sum = 0.0f32;
                for channel in 0..3 {
                    let predicted = state.plane(image, channel);
                    let expected = self.target.plane(target_image, channel);
                    for (p, t) in predicted.iter().zip(expected.iter()) {
                        sum += self.criterion.distance(*p, *t);
                    }
                }
                let expected_alpha = self.target.plane(target_image, 3);
                for idx in 0..plane {
                    let alpha: f32 = alphas
                        .iter()
                        .map(|&channel| state.plane(image, channel)[idx])
                        .sum();
                    sum += self.criterion.distance(alpha, expected_alpha[idx]);
                }
                Ok(sum / (4 * plane) as f32)
            })
            .collect::<PureResult<Vec<_>>>()?;
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba_target(batch: usize, size: usize, value: f32) -> StateBatch {
        StateBatch::from_vec(
            batch,
            4,
            size,
            size,
            vec![value; batch * 4 * size * size],
        )
        .unwrap()
    }

    #[test]
    fn perfect_prediction_scores_zero() {
        let mut target = rgba_target(1, 8, 0.0);
        target.set(0, 0, 2, 2, 0.9);
        target.set(0, 3, 2, 2, 1.0);
        // State mirrors the target exactly with a single alpha channel.
        let mut state = StateBatch::zeros(1, 5, 8, 8).unwrap();
        state.set(0, 0, 2, 2, 0.9);
        state.set(0, 3, 2, 2, 1.0);
        let mut loss = NcaLoss::new(target, Criterion::Mse, vec![3]).unwrap();
        let scores = loss.evaluate(&state).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(scores[0].abs() < 1e-7);
    }

    #[test]
    fn full_alpha_against_empty_target_is_plain_mse() {
        let target = rgba_target(1, 4, 0.0);
        let mut state = StateBatch::zeros(1, 6, 4, 4).unwrap();
        state.plane_mut(0, 3).fill(1.0);
        let mut loss = NcaLoss::new(target, Criterion::Mse, vec![3]).unwrap();
        let scores = loss.evaluate(&state).unwrap();
        // One of the four composited channels differs by 1 everywhere.
        assert!((scores[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn alpha_channels_are_summed_not_maxed() {
        let mut target = rgba_target(1, 2, 0.0);
        target.plane_mut(0, 3).fill(1.0);
        // Two half-intensity alphas sum to a full one.
        let mut state = StateBatch::zeros(1, 6, 2, 2).unwrap();
        state.plane_mut(0, 4).fill(0.5);
        state.plane_mut(0, 5).fill(0.5);
        let mut loss = NcaLoss::new(target, Criterion::Mse, vec![-2, -1]).unwrap();
        let scores = loss.evaluate(&state).unwrap();
        assert!(scores[0].abs() < 1e-7);
    }

    #[test]
    fn broadcast_target_scores_each_image() {
        let target = rgba_target(1, 4, 0.5);
        let state = StateBatch::zeros(3, 5, 4, 4).unwrap();
        let mut loss = NcaLoss::new(target, Criterion::Mse, vec![3]).unwrap();
        let scores = loss.evaluate(&state).unwrap();
        assert_eq!(scores.len(), 3);
        for score in scores {
            assert!((score - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn mismatched_spatial_shapes_are_rejected() {
        let target = rgba_target(1, 4, 0.0);
        let state = StateBatch::zeros(1, 5, 8, 8).unwrap();
        let mut loss = NcaLoss::new(target, Criterion::Mse, vec![3]).unwrap();
        assert!(matches!(
            loss.evaluate(&state),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }
}
