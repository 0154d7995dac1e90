// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Toroidal geometry and living-mask rules.
//!
//! The simulated domain is a torus: every neighbour-dependent rule operates on
//! [`wrap_edges`] output so opposite borders see each other as adjacent. The
//! living rule is fixed at "Moore neighbourhood, radius 1, wrapped" — a 3×3
//! stride-1 max pool with a 0.1 aliveness threshold.

use crate::state::{PureResult, StateBatch, TensorError};
use rayon::prelude::*;

/// Alpha threshold above which a cell counts as alive.
pub const ALIVE_THRESHOLD: f32 = 0.1;

/// Boolean counterpart of [`StateBatch`], one bit per pixel and channel.
#[derive(Clone, Debug, PartialEq)]
pub struct MaskBatch {
    batch: usize,
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<bool>,
}

impl MaskBatch {
    fn filled(batch: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            batch,
            channels,
            height,
            width,
            data: vec![false; batch * channels * height * width],
        }
    }

    /// Returns the `(batch, channels, height, width)` shape.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.channels, self.height, self.width)
    }

    /// Reads one mask bit.
    #[inline]
    pub fn get(&self, image: usize, channel: usize, y: usize, x: usize) -> bool {
        self.data[((image * self.channels + channel) * self.height + y) * self.width + x]
    }

    #[inline]
    fn set(&mut self, image: usize, channel: usize, y: usize, x: usize, value: bool) {
        self.data[((image * self.channels + channel) * self.height + y) * self.width + x] = value;
    }

    /// Immutable access to the raw bit buffer.
    pub fn data(&self) -> &[bool] {
        &self.data
    }

    /// Number of set bits, handy when asserting on growth extents.
    pub fn count_alive(&self) -> usize {
        self.data.iter().filter(|&&bit| bit).count()
    }
}

/// Pads both spatial borders by one pixel with circular wraparound.
pub fn wrap_edges(images: &StateBatch) -> PureResult<StateBatch> {
    let (batch, channels, height, width) = images.shape();
    let mut wrapped = StateBatch::zeros(batch, channels, height + 2, width + 2)?;
    let out_width = width + 2;
    let plane = (height + 2) * out_width;
    wrapped
        .data_mut()
        .par_chunks_mut(plane)
        .enumerate()
        .for_each(|(p, out_plane)| {
            let image = p / channels;
            let channel = p % channels;
            let src = images.plane(image, channel);
            for y in 0..height + 2 {
                let src_y = (y + height - 1) % height;
                for x in 0..out_width {
                    let src_x = (x + width - 1) % width;
                    out_plane[y * out_width + x] = src[src_y * width + src_x];
                }
            }
        });
    Ok(wrapped)
}

/// 3×3 stride-1 max pool over wrapped data. Output keeps the input shape, so
/// every pixel sees its full Moore neighbourhood across the torus seam.
pub fn max_pool3x3_wrapped(images: &StateBatch) -> PureResult<StateBatch> {
    let (batch, channels, height, width) = images.shape();
    let wrapped = wrap_edges(images)?;
    let wrapped_width = width + 2;
    let mut pooled = StateBatch::zeros(batch, channels, height, width)?;
    let plane = height * width;
    pooled
        .data_mut()
        .par_chunks_mut(plane)
        .enumerate()
        .for_each(|(p, out_plane)| {
            let image = p / channels;
            let channel = p % channels;
            let src = wrapped.plane(image, channel);
            for y in 0..height {
                for x in 0..width {
                    let mut best = f32::NEG_INFINITY;
                    for dy in 0..3 {
                        let row = (y + dy) * wrapped_width + x;
                        for dx in 0..3 {
                            let value = src[row + dx];
                            if value > best {
                                best = value;
                            }
                        }
                    }
                    out_plane[y * width + x] = best;
                }
            }
        });
    Ok(pooled)
}

/// Computes the living mask over the given alpha channels: a pixel is alive
/// if any 3×3 wrapped neighbour exceeds [`ALIVE_THRESHOLD`] in at least one
/// of the channels. The result is OR-ed across channels into a single plane.
pub fn get_living_mask(images: &StateBatch, channels: &[i64]) -> PureResult<MaskBatch> {
    if channels.is_empty() {
        return Err(TensorError::EmptyInput("living_mask channels"));
    }
    let resolved = channels
        .iter()
        .map(|&channel| images.resolve_channel(channel))
        .collect::<PureResult<Vec<_>>>()?;
    let (batch, _, height, width) = images.shape();

    let alpha = select_channels(images, &resolved)?;
    let pooled = max_pool3x3_wrapped(&alpha)?;

    let mut mask = MaskBatch::filled(batch, 1, height, width);
    for image in 0..batch {
        for y in 0..height {
            for x in 0..width {
                let alive = (0..resolved.len())
                    .any(|k| pooled.get(image, k, y, x) > ALIVE_THRESHOLD);
                mask.set(image, 0, y, x, alive);
            }
        }
    }
    Ok(mask)
}

/// Per-channel evolvable mask for competing automata. The input holds only the
/// K alpha channels. Channel `k` may act on a pixel when the pixel is free
/// (every alpha below the threshold) and adjacent to channel `k`'s own mass,
/// or when channel `k` already dominates the pixel. Ties at the per-pixel
/// maximum mark every tied channel as dominating; that is the intended rule,
/// arbitration happens downstream in the update dynamics.
pub fn multiple_living_mask(alphas: &StateBatch) -> PureResult<MaskBatch> {
    let (batch, channels, height, width) = alphas.shape();
    let pooled = max_pool3x3_wrapped(alphas)?;

    let mut mask = MaskBatch::filled(batch, channels, height, width);
    for image in 0..batch {
        for y in 0..height {
            for x in 0..width {
                let mut biggest = f32::NEG_INFINITY;
                for channel in 0..channels {
                    biggest = biggest.max(alphas.get(image, channel, y, x));
                }
                let free = biggest < ALIVE_THRESHOLD;
                for channel in 0..channels {
                    let value = alphas.get(image, channel, y, x);
                    let old = value == biggest && value >= ALIVE_THRESHOLD;
                    let neighbor = pooled.get(image, channel, y, x) >= ALIVE_THRESHOLD;
                    mask.set(image, channel, y, x, (free && neighbor) || old);
                }
            }
        }
    }
    Ok(mask)
}

fn select_channels(images: &StateBatch, channels: &[usize]) -> PureResult<StateBatch> {
    let (batch, _, height, width) = images.shape();
    let mut data = Vec::with_capacity(batch * channels.len() * height * width);
    for image in 0..batch {
        for &channel in channels {
            data.extend_from_slice(images.plane(image, channel));
        }
    }
    StateBatch::from_vec(batch, channels.len(), height, width, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_edges_connects_opposite_borders() {
        let mut state = StateBatch::zeros(1, 1, 3, 4).unwrap();
        for y in 0..3 {
            for x in 0..4 {
                state.set(0, 0, y, x, (y * 4 + x) as f32);
            }
        }
        let wrapped = wrap_edges(&state).unwrap();
        assert_eq!(wrapped.shape(), (1, 1, 5, 6));
        // Interior equals the original.
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(wrapped.get(0, 0, y + 1, x + 1), state.get(0, 0, y, x));
            }
        }
        // Column 0 of the padded grid holds the last original column.
        for y in 0..3 {
            assert_eq!(wrapped.get(0, 0, y + 1, 0), state.get(0, 0, y, 3));
            assert_eq!(wrapped.get(0, 0, y + 1, 5), state.get(0, 0, y, 0));
        }
        // Same for rows.
        for x in 0..4 {
            assert_eq!(wrapped.get(0, 0, 0, x + 1), state.get(0, 0, 2, x));
            assert_eq!(wrapped.get(0, 0, 4, x + 1), state.get(0, 0, 0, x));
        }
        // Corners wrap diagonally.
        assert_eq!(wrapped.get(0, 0, 0, 0), state.get(0, 0, 2, 3));
    }

    #[test]
    fn living_mask_is_empty_for_dead_state() {
        let state = StateBatch::zeros(2, 4, 6, 6).unwrap();
        let mask = get_living_mask(&state, &[3]).unwrap();
        assert_eq!(mask.count_alive(), 0);
    }

    #[test]
    fn living_mask_covers_the_moore_neighbourhood() {
        let mut state = StateBatch::zeros(1, 4, 8, 8).unwrap();
        state.set(0, 3, 2, 5, 1.0);
        let mask = get_living_mask(&state, &[-1]).unwrap();
        assert_eq!(mask.count_alive(), 9);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let y = (2 + dy).rem_euclid(8) as usize;
                let x = (5 + dx).rem_euclid(8) as usize;
                assert!(mask.get(0, 0, y, x));
            }
        }
        assert!(!mask.get(0, 0, 2, 3));
    }

    #[test]
    fn living_mask_wraps_around_edges() {
        let mut state = StateBatch::zeros(1, 4, 6, 6).unwrap();
        state.set(0, 3, 0, 0, 1.0);
        let mask = get_living_mask(&state, &[3]).unwrap();
        assert_eq!(mask.count_alive(), 9);
        assert!(mask.get(0, 0, 5, 5));
        assert!(mask.get(0, 0, 0, 5));
        assert!(mask.get(0, 0, 5, 0));
    }

    #[test]
    fn living_mask_ors_across_channels() {
        let mut state = StateBatch::zeros(1, 5, 6, 6).unwrap();
        state.set(0, 3, 1, 1, 1.0);
        state.set(0, 4, 4, 4, 1.0);
        let both = get_living_mask(&state, &[3, 4]).unwrap();
        assert_eq!(both.count_alive(), 18);
    }

    #[test]
    fn multiple_living_mask_partitions_free_and_old_pixels() {
        // Two competing alphas on a 5x5 grid, one live pixel each.
        let mut alphas = StateBatch::zeros(1, 2, 5, 5).unwrap();
        alphas.set(0, 0, 1, 1, 0.8);
        alphas.set(0, 1, 3, 3, 0.6);
        let mask = multiple_living_mask(&alphas).unwrap();

        // Each automaton dominates its own pixel.
        assert!(mask.get(0, 0, 1, 1));
        assert!(mask.get(0, 1, 3, 3));
        // Channel 0 cannot act on the pixel channel 1 dominates.
        assert!(!mask.get(0, 0, 3, 3));
        // Free pixel adjacent to channel 0 only.
        assert!(mask.get(0, 0, 0, 0));
        assert!(!mask.get(0, 1, 0, 0));
        // (2,2) touches both neighbourhoods and is free, so both may expand.
        assert!(mask.get(0, 0, 2, 2));
        assert!(mask.get(0, 1, 2, 2));
    }

    #[test]
    fn multiple_living_mask_marks_every_tied_channel_old() {
        let mut alphas = StateBatch::zeros(1, 2, 4, 4).unwrap();
        alphas.set(0, 0, 2, 2, 0.5);
        alphas.set(0, 1, 2, 2, 0.5);
        let mask = multiple_living_mask(&alphas).unwrap();
        assert!(mask.get(0, 0, 2, 2));
        assert!(mask.get(0, 1, 2, 2));
    }

    #[test]
    fn sub_threshold_mass_does_not_block_expansion() {
        let mut alphas = StateBatch::zeros(1, 2, 5, 5).unwrap();
        alphas.set(0, 0, 2, 2, 0.05);
        alphas.set(0, 1, 2, 1, 0.9);
        let mask = multiple_living_mask(&alphas).unwrap();
        // 0.05 is below threshold: the pixel stays free and channel 1 may
        // grow into it, while channel 0 holds nothing there.
        assert!(mask.get(0, 1, 2, 2));
        assert!(!mask.get(0, 0, 2, 2));
    }
}
