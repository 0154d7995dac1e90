// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Capture of an automaton's evolution as a sequence of RGB frames.
//!
//! Encoding is an external collaborator behind [`FrameEncoder`]; this module
//! only prepares upscaled byte frames and hands them over, so the core stays
//! free of FFmpeg and container formats.

use crate::frames::{nearest_upscale, rgba_to_rgb, RgbFrame};
use mt_nn::CaModel;
use mt_tensor::{erase_squares, PureResult, SideSampler, StateBatch, TensorError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sink for prepared frames, typically an FFmpeg binding.
pub trait FrameEncoder {
    /// Writes the frame sequence at the given frame rate.
    fn encode(&mut self, frames: &[RgbFrame], fps: u32) -> PureResult<()>;
}

/// Mid-capture damage applied to showcase regeneration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RegenerationConfig {
    /// Area the erased square is sampled from; defaults to the image width.
    pub target_size: Option<usize>,
    /// Side-length strategy for the erased square.
    pub side: SideSampler,
}

/// Capture settings for [`record_evolution`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Number of update steps to record.
    pub n_iters: usize,
    /// Integer upscale factor applied before conversion to bytes.
    pub rescale: usize,
    /// Frame rate handed to the encoder.
    pub fps: u32,
    /// When set, a square is erased one third of the way through the capture.
    pub regeneration: Option<RegenerationConfig>,
}

impl RecorderConfig {
    pub fn new(n_iters: usize) -> Self {
        Self {
            n_iters,
            rescale: 8,
            fps: 10,
            regeneration: None,
        }
    }

    pub fn with_regeneration(mut self, regeneration: RegenerationConfig) -> Self {
        self.regeneration = Some(regeneration);
        self
    }
}

/// Evolves the first image of `init_state` for `n_iters` steps, capturing an
/// upscaled RGB frame before every step. Returns the frames together with the
/// final state so a later capture can resume where this one stopped.
pub fn record_evolution(
    model: &dyn CaModel,
    init_state: &StateBatch,
    config: &RecorderConfig,
    rng: &mut impl Rng,
) -> PureResult<(Vec<RgbFrame>, StateBatch)> {
    if config.n_iters == 0 {
        return Err(TensorError::EmptyInput("recorder iterations"));
    }
    let mut state = init_state.clone();
    let mut frames = Vec::with_capacity(config.n_iters);
    for iteration in 0..config.n_iters {
        let scaled = nearest_upscale(&state, config.rescale)?;
        frames.push(rgba_to_rgb(&scaled, 0)?);
        state = model.step(&state)?;
        if let Some(regeneration) = &config.regeneration {
            if iteration == config.n_iters / 3 {
                debug!(iteration, "erasing square to showcase regeneration");
                state = erase_squares(&state, regeneration.target_size, regeneration.side, rng)?;
            }
        }
    }
    Ok((frames, state))
}

/// Concatenates an optional earlier capture with the new frames and hands the
/// sequence to the encoder.
pub fn export_video(
    frames: &[RgbFrame],
    initial: Option<&[RgbFrame]>,
    fps: u32,
    encoder: &mut dyn FrameEncoder,
) -> PureResult<()> {
    match initial {
        Some(prefix) => {
            let mut sequence = Vec::with_capacity(prefix.len() + frames.len());
            sequence.extend_from_slice(prefix);
            sequence.extend_from_slice(frames);
            encoder.encode(&sequence, fps)
        }
        None => encoder.encode(frames, fps),
    }
}
