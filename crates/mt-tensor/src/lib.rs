// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Pure Rust state tensors and perturbation primitives for neural
//! cellular-automaton image models.
//!
//! The crate keeps the whole stack in safe Rust with no native bindings:
//! batched `[batch, channel, height, width]` grids, toroidal wrap and
//! living-mask rules, seed construction, erasure and virus perturbations,
//! and the channel re-layouts the multi-automaton training loop needs.

pub mod layout;
pub mod mask;
pub mod perturb;
pub mod state;

pub use layout::{multiple_to_single, single_to_multiple};
pub use mask::{
    get_living_mask, max_pool3x3_wrapped, multiple_living_mask, wrap_edges, MaskBatch,
    ALIVE_THRESHOLD,
};
pub use perturb::{add_virus, erase_rectangles, erase_squares, SideSampler};
pub use state::{PureResult, StateBatch, TensorError};
