// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of MorphoTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! The seam between this crate and the neural update rule.
//!
//! The network architecture is an external collaborator: training utilities
//! only ever ask a model to advance a state batch and to expose its flattened
//! parameters. Anything implementing [`CaModel`] plugs into the virus
//! generator, the recorder, and the parameter-distance loss.

use mt_tensor::{PureResult, StateBatch};

/// A neural cellular automaton update rule.
pub trait CaModel {
    /// Applies one update step to the batch.
    fn step(&self, state: &StateBatch) -> PureResult<StateBatch>;

    /// Applies `n_steps` update steps.
    fn evolve(&self, state: &StateBatch, n_steps: usize) -> PureResult<StateBatch> {
        let mut current = state.clone();
        for _ in 0..n_steps {
            current = self.step(&current)?;
        }
        Ok(current)
    }

    /// Flattened view of every trainable parameter, in a stable order.
    fn parameters(&self) -> Vec<f32>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl CaModel for Doubler {
        fn step(&self, state: &StateBatch) -> PureResult<StateBatch> {
            let mut next = state.clone();
            for value in next.data_mut() {
                *value *= 2.0;
            }
            Ok(next)
        }

        fn parameters(&self) -> Vec<f32> {
            vec![2.0]
        }
    }

    #[test]
    fn evolve_folds_step() {
        let mut state = StateBatch::zeros(1, 1, 2, 2).unwrap();
        state.set(0, 0, 0, 0, 1.0);
        let evolved = Doubler.evolve(&state, 3).unwrap();
        assert_eq!(evolved.get(0, 0, 0, 0), 8.0);
    }

    #[test]
    fn evolve_zero_steps_is_identity() {
        let state = StateBatch::zeros(2, 3, 4, 4).unwrap();
        let evolved = Doubler.evolve(&state, 0).unwrap();
        assert_eq!(evolved, state);
    }
}
