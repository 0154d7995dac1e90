// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Channel re-layouts between the multi-automaton representation
//! (`[rgb, hidden, K alphas]`) and the single-automaton representation
//! (`[rgb, alpha, hidden]`) consumed by a one-alpha update rule.
//!
//! The two transforms are non-strict inverses for the alpha slot they move:
//! RGB and hidden channels round-trip exactly, the alpha slice returns to its
//! original position, and alpha slots belonging to other automata come back
//! zeroed.

use crate::state::{PureResult, StateBatch, TensorError};

/// Projects a multi-automaton batch down to the single-alpha layout by
/// selecting `alpha_channel` and re-seating it between RGB and the hidden
/// channels. `n_channels` counts RGB plus hidden, excluding the alpha slots.
pub fn multiple_to_single(
    x: &StateBatch,
    n_channels: usize,
    alpha_channel: i64,
) -> PureResult<StateBatch> {
    let (batch, channels, height, width) = x.shape();
    if n_channels < 3 || n_channels > channels {
        return Err(TensorError::InvalidValue { label: "n_channels" });
    }
    let alpha = x.resolve_channel(alpha_channel)?;
    let mut data = Vec::with_capacity(batch * (n_channels + 1) * height * width);
    for image in 0..batch {
        for channel in 0..3 {
            data.extend_from_slice(x.plane(image, channel));
        }
        data.extend_from_slice(x.plane(image, alpha));
        for channel in 3..n_channels {
            data.extend_from_slice(x.plane(image, channel));
        }
    }
    StateBatch::from_vec(batch, n_channels + 1, height, width, data)
}

/// Scatters a single-alpha batch back into the multi-automaton layout with
/// `channels` total channels. The alpha slice lands at `alpha_channel`; every
/// other alpha slot is zero.
pub fn single_to_multiple(
    dx: &StateBatch,
    channels: usize,
    n_channels: usize,
    alpha_channel: i64,
) -> PureResult<StateBatch> {
    let (batch, dx_channels, height, width) = dx.shape();
    if n_channels < 3 || n_channels > channels {
        return Err(TensorError::InvalidValue { label: "n_channels" });
    }
    if dx_channels != n_channels + 1 {
        return Err(TensorError::DataLength {
            expected: n_channels + 1,
            got: dx_channels,
        });
    }
    let mut out = StateBatch::zeros(batch, channels, height, width)?;
    let alpha = out.resolve_channel(alpha_channel)?;
    for image in 0..batch {
        for channel in 0..3 {
            out.plane_mut(image, channel)
                .copy_from_slice(dx.plane(image, channel));
        }
        out.plane_mut(image, alpha)
            .copy_from_slice(dx.plane(image, 3));
        for channel in 3..n_channels {
            out.plane_mut(image, channel)
                .copy_from_slice(dx.plane(image, channel + 1));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(batch: usize, channels: usize, size: usize) -> StateBatch {
        let len = batch * channels * size * size;
        let data = (0..len).map(|i| i as f32).collect();
        StateBatch::from_vec(batch, channels, size, size, data).unwrap()
    }

    #[test]
    fn round_trip_preserves_rgb_hidden_and_alpha_position() {
        // 3 RGB + 2 hidden + 2 alphas.
        let n_channels = 5;
        let multi = numbered(2, 7, 4);
        for alpha_channel in [5i64, 6, -2, -1] {
            let single = multiple_to_single(&multi, n_channels, alpha_channel).unwrap();
            assert_eq!(single.channels(), n_channels + 1);
            let back =
                single_to_multiple(&single, 7, n_channels, alpha_channel).unwrap();
            let alpha = multi.resolve_channel(alpha_channel).unwrap();
            for image in 0..2 {
                for channel in 0..n_channels {
                    assert_eq!(back.plane(image, channel), multi.plane(image, channel));
                }
                assert_eq!(back.plane(image, alpha), multi.plane(image, alpha));
                // The other alpha slot was not selected and returns zeroed.
                let other = if alpha == 5 { 6 } else { 5 };
                assert!(back.plane(image, other).iter().all(|&v| v == 0.0));
            }
        }
    }

    #[test]
    fn single_layout_orders_rgb_alpha_hidden() {
        let multi = numbered(1, 6, 2);
        let single = multiple_to_single(&multi, 4, -1).unwrap();
        assert_eq!(single.plane(0, 0), multi.plane(0, 0));
        assert_eq!(single.plane(0, 3), multi.plane(0, 5));
        assert_eq!(single.plane(0, 4), multi.plane(0, 3));
    }

    #[test]
    fn rejects_inconsistent_channel_counts() {
        let multi = numbered(1, 6, 2);
        assert!(multiple_to_single(&multi, 7, -1).is_err());
        let single = numbered(1, 5, 2);
        assert!(matches!(
            single_to_multiple(&single, 6, 5, -1),
            Err(TensorError::DataLength { .. })
        ));
    }
}
