// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Batched multi-channel cellular-automaton state tensors.
//!
//! A [`StateBatch`] stores `[batch, channel, height, width]` grids in a flat
//! `f32` buffer. Channels are partitioned by convention: channels `0..3` hold
//! RGB colour, one or more alpha channels gate where the update rule acts, and
//! the remaining channels carry hidden state owned entirely by the update
//! rule. Everything here is safe Rust with no native bindings.

use core::fmt;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::ops::Range;

/// Result alias used throughout MorphoTorch.
pub type PureResult<T> = Result<T, TensorError>;

/// Errors emitted by state tensors and the utilities built on them.
#[derive(Clone, Debug, PartialEq)]
pub enum TensorError {
    /// A constructor received a shape with a zero axis.
    InvalidDimensions {
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
    },
    /// Data provided to a constructor or operator does not match the shape.
    DataLength { expected: usize, got: usize },
    /// An operator was asked to combine batches of incompatible shapes.
    ShapeMismatch {
        left: (usize, usize, usize, usize),
        right: (usize, usize, usize, usize),
    },
    /// A channel index fell outside the channel axis after resolution.
    ChannelOutOfRange { channel: i64, channels: usize },
    /// Computation received an empty input which would otherwise panic.
    EmptyInput(&'static str),
    /// Generic configuration violation for pure-language helpers.
    InvalidValue { label: &'static str },
    /// Numeric guard detected a non-finite value before it could propagate.
    NonFiniteValue { label: &'static str, value: f32 },
    /// Wrapper around I/O failures when exporting rendered frames.
    IoError { message: String },
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::InvalidDimensions {
                batch,
                channels,
                height,
                width,
            } => {
                write!(
                    f,
                    "invalid state dimensions ({batch} x {channels} x {height} x {width}); every axis must be non-zero"
                )
            }
            TensorError::DataLength { expected, got } => {
                write!(f, "data length mismatch: expected {expected}, got {got}")
            }
            TensorError::ShapeMismatch { left, right } => {
                write!(
                    f,
                    "shape mismatch: left={:?}, right={:?} cannot be combined",
                    left, right
                )
            }
            TensorError::ChannelOutOfRange { channel, channels } => {
                write!(
                    f,
                    "channel index {channel} is out of range for a state with {channels} channels"
                )
            }
            TensorError::EmptyInput(label) => {
                write!(f, "{label} must not be empty for this computation")
            }
            TensorError::InvalidValue { label } => {
                write!(f, "invalid value supplied for {label}")
            }
            TensorError::NonFiniteValue { label, value } => {
                write!(f, "non-finite value detected for {label}: {value}")
            }
            TensorError::IoError { message } => {
                write!(f, "i/o error while handling frame data: {message}")
            }
        }
    }
}

impl Error for TensorError {}

/// Batch of multi-channel 2D grids laid out as `[batch, channel, height, width]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateBatch {
    batch: usize,
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl StateBatch {
    /// Creates a batch filled with zeros.
    pub fn zeros(
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
    ) -> PureResult<Self> {
        if batch == 0 || channels == 0 || height == 0 || width == 0 {
            return Err(TensorError::InvalidDimensions {
                batch,
                channels,
                height,
                width,
            });
        }
        Ok(Self {
            batch,
            channels,
            height,
            width,
            data: vec![0.0; batch * channels * height * width],
        })
    }

    /// Builds a batch from an existing flat buffer in NCHW order.
    pub fn from_vec(
        batch: usize,
        channels: usize,
        height: usize,
        width: usize,
        data: Vec<f32>,
    ) -> PureResult<Self> {
        if batch == 0 || channels == 0 || height == 0 || width == 0 {
            return Err(TensorError::InvalidDimensions {
                batch,
                channels,
                height,
                width,
            });
        }
        let expected = batch * channels * height * width;
        if data.len() != expected {
            return Err(TensorError::DataLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            batch,
            channels,
            height,
            width,
            data,
        })
    }

    /// Creates `n_images` seed states: all zero except a single unit pixel at
    /// the spatial centre of the resolved alpha channel. The channel axis has
    /// `n_channels + n_cas` entries so every competing automaton variant owns
    /// an alpha slot.
    pub fn seed(
        n_images: usize,
        n_channels: usize,
        image_size: usize,
        n_cas: usize,
        alpha_channel: i64,
    ) -> PureResult<Self> {
        let mut state = Self::zeros(n_images, n_channels + n_cas, image_size, image_size)?;
        let alpha = state.resolve_channel(alpha_channel)?;
        let centre = image_size / 2;
        for image in 0..n_images {
            let idx = state.index(image, alpha, centre, centre);
            state.data[idx] = 1.0;
        }
        Ok(state)
    }

    /// Returns the full `(batch, channels, height, width)` shape.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.batch, self.channels, self.height, self.width)
    }

    /// Number of images in the batch.
    pub fn batch(&self) -> usize {
        self.batch
    }

    /// Number of channels per image.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Immutable access to the raw NCHW buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable access to the raw NCHW buffer.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Resolves a possibly-negative channel index against the channel axis.
    /// Negative indices count from the end, matching the convention the
    /// training configs use for alpha slots (`-1` is the last channel).
    pub fn resolve_channel(&self, channel: i64) -> PureResult<usize> {
        let channels = self.channels as i64;
        let resolved = if channel < 0 { channels + channel } else { channel };
        if resolved < 0 || resolved >= channels {
            return Err(TensorError::ChannelOutOfRange {
                channel,
                channels: self.channels,
            });
        }
        Ok(resolved as usize)
    }

    #[inline]
    pub(crate) fn index(&self, image: usize, channel: usize, y: usize, x: usize) -> usize {
        debug_assert!(image < self.batch && channel < self.channels);
        debug_assert!(y < self.height && x < self.width);
        ((image * self.channels + channel) * self.height + y) * self.width + x
    }

    /// Reads one value. Callers must keep indices in bounds.
    #[inline]
    pub fn get(&self, image: usize, channel: usize, y: usize, x: usize) -> f32 {
        self.data[self.index(image, channel, y, x)]
    }

    /// Writes one value. Callers must keep indices in bounds.
    #[inline]
    pub fn set(&mut self, image: usize, channel: usize, y: usize, x: usize, value: f32) {
        let idx = self.index(image, channel, y, x);
        self.data[idx] = value;
    }

    fn plane_range(&self, image: usize, channel: usize) -> Range<usize> {
        let plane = self.height * self.width;
        let start = (image * self.channels + channel) * plane;
        start..start + plane
    }

    /// Immutable view of one `height * width` channel plane.
    pub fn plane(&self, image: usize, channel: usize) -> &[f32] {
        &self.data[self.plane_range(image, channel)]
    }

    /// Mutable view of one channel plane.
    pub fn plane_mut(&mut self, image: usize, channel: usize) -> &mut [f32] {
        let range = self.plane_range(image, channel);
        &mut self.data[range]
    }

    /// Sum of a channel plane, the "mass" carried by that channel.
    pub fn plane_sum(&self, image: usize, channel: usize) -> f32 {
        self.plane(image, channel).iter().sum()
    }

    /// Copies out a contiguous run of images. The end of the range is clamped
    /// to the batch size, mirroring slice-truncation semantics, so the last
    /// sub-batch of an uneven split simply comes back shorter.
    pub fn sub_batch(&self, range: Range<usize>) -> PureResult<Self> {
        let start = range.start;
        let end = range.end.min(self.batch);
        if start >= end {
            return Err(TensorError::EmptyInput("sub_batch range"));
        }
        let stride = self.channels * self.height * self.width;
        let data = self.data[start * stride..end * stride].to_vec();
        Self::from_vec(end - start, self.channels, self.height, self.width, data)
    }

    /// Writes `other` back into the batch starting at image `start`.
    pub fn write_sub_batch(&mut self, start: usize, other: &StateBatch) -> PureResult<()> {
        if other.channels != self.channels
            || other.height != self.height
            || other.width != self.width
        {
            return Err(TensorError::ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        if start + other.batch > self.batch {
            return Err(TensorError::DataLength {
                expected: self.batch,
                got: start + other.batch,
            });
        }
        let stride = self.channels * self.height * self.width;
        let dst = &mut self.data[start * stride..(start + other.batch) * stride];
        dst.copy_from_slice(&other.data);
        Ok(())
    }
}
