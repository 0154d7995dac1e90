// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Training utilities for neural cellular-automaton image models: loss
//! objects, curriculum weighting, duration sampling, and the virus generator
//! that manufactures robustness-training batches.
//!
//! The update rule itself is an external collaborator behind the [`CaModel`]
//! trait; nothing here knows about architectures or optimizers.

pub mod generator;
pub mod loss;
pub mod module;
pub mod sampler;
pub mod schedule;

pub use generator::VirusGenerator;
pub use loss::{CellRatioLoss, CombinedLoss, Criterion, Loss, NcaLoss, ParameterDistance};
pub use module::CaModel;
pub use sampler::ExponentialSampler;
pub use schedule::{ConstantWeights, RampWeights, WeightSchedule};

pub use mt_tensor::{PureResult, StateBatch, TensorError};
