// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Stochastic perturbations used for robustness training: square and
//! rectangular erasure, and the virus injection that reassigns living mass to
//! a competing alpha channel.
//!
//! Every function takes the RNG explicitly so a fixed seed reproduces a
//! training run exactly. Erased regions are clamped at the image borders by
//! slicing; going out of bounds truncates the region instead of failing.

use crate::state::{PureResult, StateBatch, TensorError};
use rand::distributions::{Bernoulli, Distribution};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Strategy that draws the side length of an erased region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideSampler {
    /// Always `size / 2`, used when demonstrations should be comparable.
    Constant,
    /// Uniform in `[size / 6, size / 2]`.
    Uniform,
}

impl SideSampler {
    /// Draws one side length for a region carved out of a `size`-wide image.
    pub fn sample(&self, size: usize, rng: &mut impl Rng) -> usize {
        match self {
            SideSampler::Constant => size / 2,
            SideSampler::Uniform => rng.gen_range(size / 6..=size / 2),
        }
    }
}

/// Zeroes one random square per image across all channels and returns the
/// perturbed copy; the input is left untouched. Centres are drawn from the
/// middle half of the target area so the erased patch overlaps the grown
/// pattern rather than empty border.
pub fn erase_squares(
    images: &StateBatch,
    target_size: Option<usize>,
    side: SideSampler,
    rng: &mut impl Rng,
) -> PureResult<StateBatch> {
    let mut out = images.clone();
    let (batch, channels, height, width) = out.shape();
    let target = target_size.unwrap_or(width);
    for image in 0..batch {
        let centre_y = rng.gen_range(target / 2 - target / 4..=target / 2 + target / 4);
        let centre_x = rng.gen_range(target / 2 - target / 4..=target / 2 + target / 4);
        let half = side.sample(target, rng) / 2;
        // A target area larger than the grid can push the whole region past
        // the border; clamping both ends truncates it to empty instead.
        let y0 = centre_y.saturating_sub(half).min(height);
        let y1 = (centre_y + half).min(height);
        let x0 = centre_x.saturating_sub(half).min(width);
        let x1 = (centre_x + half).min(width);
        if y0 >= y1 || x0 >= x1 {
            continue;
        }
        for channel in 0..channels {
            let plane = out.plane_mut(image, channel);
            for y in y0..y1 {
                plane[y * width + x0..y * width + x1].fill(0.0);
            }
        }
    }
    Ok(out)
}

/// Zeroes one random axis-aligned rectangle per image, in place. Two corner
/// points are drawn independently from the middle half and each edge is then
/// pushed outwards by half a sampled side, so the carved region is a
/// rectangle rather than a centred square. When the corners invert the
/// region collapses to empty, which is accepted.
pub fn erase_rectangles(
    images: &mut StateBatch,
    target_size: Option<usize>,
    side: SideSampler,
    rng: &mut impl Rng,
) -> PureResult<()> {
    let (batch, channels, height, width) = images.shape();
    let target = target_size.unwrap_or(width);
    for image in 0..batch {
        let lo = target / 2 - target / 4;
        let hi = target / 2 + target / 4;
        let y_a = rng.gen_range(lo..=hi);
        let y_b = rng.gen_range(lo..=hi);
        let x_a = rng.gen_range(lo..=hi);
        let x_b = rng.gen_range(lo..=hi);
        let y0 = y_a.saturating_sub(side.sample(target, rng) / 2);
        let y1 = (y_b + side.sample(target, rng) / 2).min(height);
        let x0 = x_a.saturating_sub(side.sample(target, rng) / 2);
        let x1 = (x_b + side.sample(target, rng) / 2).min(width);
        if y0 >= y1 || x0 >= x1 {
            continue;
        }
        for channel in 0..channels {
            let plane = images.plane_mut(image, channel);
            for row in y0..y1 {
                plane[row * width + x0..row * width + x1].fill(0.0);
            }
        }
    }
    Ok(())
}

/// Moves a Bernoulli-sampled fraction of the original alpha channel into the
/// virus channel, in place. Where the mask fires the original is zeroed and
/// the virus receives its value; everywhere else the virus channel is
/// overwritten with zero. The overwrite is intentional: after injection the
/// virus channel holds exactly `original * mask`, nothing older survives.
pub fn add_virus(
    images: &mut StateBatch,
    original_channel: i64,
    virus_channel: i64,
    virus_rate: f32,
    rng: &mut impl Rng,
) -> PureResult<()> {
    let original = images.resolve_channel(original_channel)?;
    let virus = images.resolve_channel(virus_channel)?;
    let distribution = Bernoulli::new(virus_rate as f64)
        .map_err(|_| TensorError::InvalidValue { label: "virus_rate" })?;
    let (batch, _, height, width) = images.shape();
    for image in 0..batch {
        for y in 0..height {
            for x in 0..width {
                let infected = distribution.sample(rng);
                let value = images.get(image, original, y, x);
                if infected {
                    images.set(image, virus, y, x, value);
                    images.set(image, original, y, x, 0.0);
                } else {
                    images.set(image, virus, y, x, 0.0);
                }
            }
        }
    }
    Ok(())
}
