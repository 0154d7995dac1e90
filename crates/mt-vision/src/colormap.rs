// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Scalar-field rendering through a colormap, used to visualise hidden
//! channels and living masks during evaluation.

use crate::frames::RgbFrame;
use mt_tensor::{PureResult, StateBatch, TensorError};
use tracing::warn;

/// Range below which a field is considered flat and rendered as all-zero
/// instead of being stretched into noise.
pub const GRAYSCALE_EPSILON: f32 = 1e-6;

/// Maps a normalised scalar in `[0, 1]` to an RGB colour.
pub trait Colormap {
    fn rgb(&self, t: f32) -> [u8; 3];
}

/// Piecewise-linear approximation of matplotlib's viridis.
#[derive(Clone, Copy, Debug, Default)]
pub struct Viridis;

const VIRIDIS_ANCHORS: [[u8; 3]; 9] = [
    [68, 1, 84],
    [72, 40, 120],
    [62, 74, 137],
    [49, 104, 142],
    [38, 130, 142],
    [31, 158, 137],
    [53, 183, 121],
    [109, 205, 89],
    [253, 231, 37],
];

impl Colormap for Viridis {
    fn rgb(&self, t: f32) -> [u8; 3] {
        let t = t.clamp(0.0, 1.0);
        let scaled = t * (VIRIDIS_ANCHORS.len() - 1) as f32;
        let low = scaled.floor() as usize;
        let high = (low + 1).min(VIRIDIS_ANCHORS.len() - 1);
        let frac = scaled - low as f32;
        let mut rgb = [0u8; 3];
        for (idx, slot) in rgb.iter_mut().enumerate() {
            let a = VIRIDIS_ANCHORS[low][idx] as f32;
            let b = VIRIDIS_ANCHORS[high][idx] as f32;
            *slot = (a + (b - a) * frac).round() as u8;
        }
        rgb
    }
}

/// Renders one channel plane of one image through a colormap.
///
/// The plane is min-max normalised first. A flat plane (range below
/// [`GRAYSCALE_EPSILON`]) renders as the colormap's zero colour everywhere;
/// that case is logged since it usually means a dead channel was selected.
/// Invalid image or channel indices are reported as errors rather than being
/// silently rendered.
pub fn colormap_frame(
    state: &StateBatch,
    image: usize,
    channel: i64,
    cmap: &dyn Colormap,
) -> PureResult<RgbFrame> {
    let resolved = state.resolve_channel(channel)?;
    let (batch, _, height, width) = state.shape();
    if image >= batch {
        return Err(TensorError::InvalidValue { label: "image index" });
    }
    let plane = state.plane(image, resolved);

    let mut lowest = f32::INFINITY;
    let mut highest = f32::NEG_INFINITY;
    for &value in plane {
        lowest = lowest.min(value);
        highest = highest.max(value);
    }
    let scale = highest - lowest;

    let mut data = Vec::with_capacity(height * width * 3);
    if scale < GRAYSCALE_EPSILON {
        warn!(image, channel, "flat field rendered through colormap");
        let zero = cmap.rgb(0.0);
        for _ in 0..height * width {
            data.extend_from_slice(&zero);
        }
    } else {
        for &value in plane {
            data.extend_from_slice(&cmap.rgb((value - lowest) / scale));
        }
    }
    RgbFrame::from_bytes(height, width, data)
}
