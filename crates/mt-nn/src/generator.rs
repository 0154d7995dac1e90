// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Virus-perturbed batch generation for robustness training.

use crate::module::CaModel;
use crate::sampler::ExponentialSampler;
use mt_tensor::{add_virus, PureResult, StateBatch};
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Images evolved per chunk while growing the seed batch. Bounds peak compute
/// per `evolve` call; the result is identical to evolving the whole batch.
const EVOLVE_CHUNK: usize = 32;

/// Produces training batches that have grown for a random number of steps and
/// then been partially converted to the virus channel.
///
/// The duration sampler is injected at construction so call sites never share
/// a hidden default instance, and exactly one duration is drawn per
/// `generate` call: every image in the batch is evolved for the same number
/// of steps.
pub struct VirusGenerator {
    n_channels: usize,
    image_size: usize,
    n_cas: usize,
    model: Arc<dyn CaModel>,
    virus_rate: f32,
    sampler: ExponentialSampler,
}

impl VirusGenerator {
    pub fn new(
        n_channels: usize,
        image_size: usize,
        n_cas: usize,
        model: Arc<dyn CaModel>,
        virus_rate: f32,
        sampler: ExponentialSampler,
    ) -> Self {
        Self {
            n_channels,
            image_size,
            n_cas,
            model,
            virus_rate,
            sampler,
        }
    }

    /// Seeds `n_images` states with the original automaton's alpha in the
    /// second-to-last channel, evolves them, and injects the virus into the
    /// last channel.
    pub fn generate(&self, n_images: usize, rng: &mut impl Rng) -> PureResult<StateBatch> {
        let mut batch =
            StateBatch::seed(n_images, self.n_channels, self.image_size, self.n_cas, -2)?;
        let steps = self.sampler.sample_one(rng) as usize;
        debug!(n_images, steps, "growing virus batch");

        let mut start = 0;
        while start < n_images {
            let chunk = batch.sub_batch(start..start + EVOLVE_CHUNK)?;
            let evolved = self.model.evolve(&chunk, steps)?;
            batch.write_sub_batch(start, &evolved)?;
            start += EVOLVE_CHUNK;
        }

        add_virus(&mut batch, -2, -1, self.virus_rate, rng)?;
        Ok(batch)
    }
}
