// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Display-range conversions between the 0-1 float state representation and
//! 0-255 RGB byte frames, plus nearest-neighbour upscaling for the small
//! grids the automata live on.

use mt_tensor::{PureResult, StateBatch, TensorError};

/// One RGB image in HWC byte order, ready for an encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbFrame {
    height: usize,
    width: usize,
    data: Vec<u8>,
}

impl RgbFrame {
    /// Builds a frame from raw HWC bytes.
    pub fn from_bytes(height: usize, width: usize, data: Vec<u8>) -> PureResult<Self> {
        if data.len() != height * width * 3 {
            return Err(TensorError::DataLength {
                expected: height * width * 3,
                got: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw HWC byte buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reads one pixel.
    pub fn pixel(&self, y: usize, x: usize) -> [u8; 3] {
        let base = (y * self.width + x) * 3;
        [self.data[base], self.data[base + 1], self.data[base + 2]]
    }
}

#[inline]
fn to_byte(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

/// Converts a 0-255 byte batch into the 0-1 float range, clipped.
pub fn bytes_to_float(
    bytes: &[u8],
    batch: usize,
    channels: usize,
    height: usize,
    width: usize,
) -> PureResult<StateBatch> {
    let expected = batch * channels * height * width;
    if bytes.len() != expected {
        return Err(TensorError::DataLength {
            expected,
            got: bytes.len(),
        });
    }
    let data = bytes
        .iter()
        .map(|&byte| (byte as f32 / 255.0).clamp(0.0, 1.0))
        .collect();
    StateBatch::from_vec(batch, channels, height, width, data)
}

/// Converts a 0-1 float batch into 0-255 bytes in NCHW order, clipped.
pub fn float_to_bytes(state: &StateBatch) -> Vec<u8> {
    state
        .data()
        .iter()
        .map(|&value| to_byte(value * 255.0))
        .collect()
}

/// Composites one image of an RGBA-leading state over a white background and
/// returns the RGB byte frame. Channel 3 is the alpha; extra channels beyond
/// the first four are ignored, so this accepts full single-automaton states.
pub fn rgba_to_rgb(state: &StateBatch, image: usize) -> PureResult<RgbFrame> {
    let (batch, channels, height, width) = state.shape();
    if channels < 4 {
        return Err(TensorError::ChannelOutOfRange {
            channel: 3,
            channels,
        });
    }
    if image >= batch {
        return Err(TensorError::InvalidValue { label: "image index" });
    }
    let alpha = state.plane(image, 3);
    let mut data = Vec::with_capacity(height * width * 3);
    for idx in 0..height * width {
        let a = alpha[idx];
        for channel in 0..3 {
            let colour = state.plane(image, channel)[idx];
            data.push(to_byte(colour * a * 255.0 + (1.0 - a) * 255.0));
        }
    }
    RgbFrame::from_bytes(height, width, data)
}

/// Nearest-neighbour upscaling of every channel by an integer factor. The
/// automata grids are tiny; without this the exported video is a blur.
pub fn nearest_upscale(state: &StateBatch, factor: usize) -> PureResult<StateBatch> {
    if factor == 0 {
        return Err(TensorError::InvalidValue { label: "upscale factor" });
    }
    let (batch, channels, height, width) = state.shape();
    let mut out = StateBatch::zeros(batch, channels, height * factor, width * factor)?;
    for image in 0..batch {
        for channel in 0..channels {
            let src = state.plane(image, channel);
            let dst = out.plane_mut(image, channel);
            let out_width = width * factor;
            for y in 0..height * factor {
                let src_row = (y / factor) * width;
                for x in 0..out_width {
                    dst[y * out_width + x] = src[src_row + x / factor];
                }
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_round_trip_is_lossless_on_byte_boundaries() {
        let bytes = vec![0u8, 51, 102, 153, 204, 255, 0, 51];
        let state = bytes_to_float(&bytes, 1, 2, 2, 2).unwrap();
        assert_eq!(float_to_bytes(&state), bytes);
    }

    #[test]
    fn bytes_to_float_checks_length() {
        assert!(matches!(
            bytes_to_float(&[0u8; 5], 1, 2, 2, 2),
            Err(TensorError::DataLength { .. })
        ));
    }

    #[test]
    fn opaque_pixels_show_their_colour_and_dead_pixels_are_white() {
        let mut state = StateBatch::zeros(1, 4, 2, 2).unwrap();
        // One fully alive red pixel at (0,0).
        state.set(0, 0, 0, 0, 1.0);
        state.set(0, 3, 0, 0, 1.0);
        let frame = rgba_to_rgb(&state, 0).unwrap();
        assert_eq!(frame.pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.pixel(1, 1), [255, 255, 255]);
    }

    #[test]
    fn half_alpha_blends_towards_white() {
        let mut state = StateBatch::zeros(1, 4, 1, 1).unwrap();
        state.set(0, 3, 0, 0, 0.5);
        let frame = rgba_to_rgb(&state, 0).unwrap();
        // Black at half coverage over white: 0.5 * 255.
        assert_eq!(frame.pixel(0, 0), [127, 127, 127]);
    }

    #[test]
    fn upscale_replicates_pixels() {
        let mut state = StateBatch::zeros(1, 1, 2, 2).unwrap();
        state.set(0, 0, 0, 1, 1.0);
        let scaled = nearest_upscale(&state, 3).unwrap();
        assert_eq!(scaled.shape(), (1, 1, 6, 6));
        assert_eq!(scaled.get(0, 0, 0, 3), 1.0);
        assert_eq!(scaled.get(0, 0, 2, 5), 1.0);
        assert_eq!(scaled.get(0, 0, 0, 2), 0.0);
        assert_eq!(scaled.get(0, 0, 3, 3), 0.0);
    }
}
