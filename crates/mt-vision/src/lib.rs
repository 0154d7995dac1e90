// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Visualisation utilities for MorphoTorch: display-range conversions,
//! colormap rendering of scalar fields, and evolution video capture behind
//! an encoder seam.

pub mod colormap;
pub mod frames;
pub mod recorder;

pub use colormap::{colormap_frame, Colormap, Viridis, GRAYSCALE_EPSILON};
pub use frames::{bytes_to_float, float_to_bytes, nearest_upscale, rgba_to_rgb, RgbFrame};
pub use recorder::{
    export_video, record_evolution, FrameEncoder, RecorderConfig, RegenerationConfig,
};
