#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! A local simulated-annealing backend.
//!
//! Classic single-flip Metropolis annealing: every read starts from a
//! random state, sweeps all variables under a geometrically rising inverse
//! temperature, then walks greedily to the bottom of its valley; the best
//! read wins. Good enough to solve the small models the encoder produces,
//! and fully deterministic under a fixed seed.

use super::{Sample, Sampler};
use crate::qubo::BinaryQuadraticModel;
use bit_vec::BitVec;
use log::debug;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Configuration of the annealer. All fields are plain knobs; the defaults
/// are sized for the models this crate produces.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAnnealer {
    /// Independent restarts; the lowest-energy result is returned.
    pub num_reads: usize,
    /// Full passes over the variables per read.
    pub num_sweeps: usize,
    /// Inverse temperature, swept geometrically from `.0` to `.1`.
    pub beta_range: (f64, f64),
    /// RNG seed; `None` draws fresh entropy per call.
    pub seed: Option<u64>,
}

impl Default for SimulatedAnnealer {
    fn default() -> Self {
        Self {
            num_reads: 10,
            num_sweeps: 1000,
            beta_range: (0.1, 10.0),
            seed: None,
        }
    }
}

/// The model flattened onto dense indices for the inner loop.
struct Dense {
    linear: Vec<f64>,
    neighbors: Vec<Vec<(usize, f64)>>,
    pairs: Vec<(usize, usize, f64)>,
    active: f64,
    inactive: f64,
    offset: f64,
}

impl Dense {
    fn value(&self, state: &BitVec, i: usize) -> f64 {
        if state[i] { self.active } else { self.inactive }
    }

    /// Energy change of flipping variable `i` in `state`.
    fn flip_delta(&self, state: &BitVec, i: usize) -> f64 {
        let current = self.value(state, i);
        let flipped = if state[i] { self.inactive } else { self.active };
        let mut field = self.linear[i];
        for &(j, bias) in &self.neighbors[i] {
            field += bias * self.value(state, j);
        }
        (flipped - current) * field
    }

    fn energy(&self, state: &BitVec) -> f64 {
        let mut energy = self.offset;
        for (i, &bias) in self.linear.iter().enumerate() {
            energy += bias * self.value(state, i);
        }
        for &(i, j, bias) in &self.pairs {
            energy += bias * self.value(state, i) * self.value(state, j);
        }
        energy
    }

    /// Flips strictly improving variables until none is left.
    fn descend(&self, state: &mut BitVec) {
        loop {
            let mut improved = false;
            for i in 0..self.linear.len() {
                if self.flip_delta(state, i) < 0.0 {
                    state.set(i, !state[i]);
                    improved = true;
                }
            }
            if !improved {
                break;
            }
        }
    }
}

impl SimulatedAnnealer {
    fn beta_at(&self, sweep: usize) -> f64 {
        let (start, end) = self.beta_range;
        if self.num_sweeps <= 1 {
            return start;
        }
        #[allow(clippy::cast_precision_loss)]
        let t = sweep as f64 / (self.num_sweeps - 1) as f64;
        start * (end / start).powf(t)
    }
}

impl<V: Copy + Eq + Hash + Ord> Sampler<V> for SimulatedAnnealer {
    fn sample(&self, model: &BinaryQuadraticModel<V>) -> Sample<V> {
        let mut variables: Vec<V> = model.variables().collect();
        variables.sort_unstable();
        let index: FxHashMap<V, usize> = variables
            .iter()
            .enumerate()
            .map(|(i, &v)| (v, i))
            .collect();

        let mut neighbors: Vec<Vec<(usize, f64)>> = vec![Vec::new(); variables.len()];
        let mut pairs: Vec<(usize, usize, f64)> = Vec::with_capacity(model.num_interactions());
        for (u, v, bias) in model.quadratic_iter() {
            let (i, j) = (index[&u], index[&v]);
            neighbors[i].push((j, bias));
            neighbors[j].push((i, bias));
            pairs.push((i, j, bias));
        }
        for adjacency in &mut neighbors {
            adjacency.sort_unstable_by_key(|&(j, _)| j);
        }
        pairs.sort_unstable_by_key(|&(i, j, _)| (i, j));

        let dense = Dense {
            linear: variables.iter().map(|&v| model.linear(v)).collect(),
            neighbors,
            pairs,
            active: f64::from(model.vartype().active_value()),
            inactive: f64::from(model.vartype().inactive_value()),
            offset: model.offset(),
        };

        let mut rng = self
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

        let mut best_state = BitVec::from_elem(variables.len(), false);
        let mut best_energy = dense.energy(&best_state);

        for read in 0..self.num_reads.max(1) {
            let mut state = BitVec::from_elem(variables.len(), false);
            for i in 0..variables.len() {
                state.set(i, rng.bool());
            }

            for sweep in 0..self.num_sweeps {
                let beta = self.beta_at(sweep);
                for i in 0..variables.len() {
                    let delta = dense.flip_delta(&state, i);
                    if delta <= 0.0 || rng.f64() < (-beta * delta).exp() {
                        state.set(i, !state[i]);
                    }
                }
            }

            dense.descend(&mut state);

            let energy = dense.energy(&state);
            debug!("read {read}: energy {energy}");
            if OrderedFloat(energy) < OrderedFloat(best_energy) {
                best_energy = energy;
                best_state = state;
            }
        }

        let assignment = variables
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let value = if best_state[i] {
                    model.vartype().active_value()
                } else {
                    model.vartype().inactive_value()
                };
                (v, value)
            })
            .collect();

        Sample {
            assignment,
            energy: best_energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::{Vartype, exactly_one};
    use crate::sudoku::{EXAMPLE_FOUR, EXAMPLE_FOUR_SOLUTION, grid_from_array};
    use crate::sudoku::encoder::{EncoderConfig, encode};

    #[test]
    fn test_single_one_hot_group_reaches_the_ground_state() {
        for vartype in [Vartype::Binary, Vartype::Spin] {
            let bqm = exactly_one(&[1u32, 2, 3], vartype);
            let annealer = SimulatedAnnealer {
                num_reads: 3,
                num_sweeps: 100,
                seed: Some(7),
                ..SimulatedAnnealer::default()
            };
            let sample = annealer.sample(&bqm);
            assert_eq!(sample.energy, 0.0, "{vartype}");
            let active = sample
                .assignment
                .values()
                .filter(|&&value| value == vartype.active_value())
                .count();
            assert_eq!(active, 1);
        }
    }

    #[test]
    fn test_disjoint_groups_all_settle() {
        // Independent groups cannot trap a greedy descent, so the ground
        // state is reached regardless of the annealing phase.
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        for group in [[1u32, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]] {
            bqm.update(exactly_one(&group, Vartype::Binary));
        }
        let annealer = SimulatedAnnealer {
            num_reads: 1,
            num_sweeps: 50,
            seed: Some(11),
            ..SimulatedAnnealer::default()
        };
        let sample = annealer.sample(&bqm);
        assert_eq!(sample.energy, 0.0);
        assert_eq!(sample.energy, bqm.energy(&sample.assignment));
    }

    #[test]
    fn test_assignment_covers_the_model_and_matches_its_energy() {
        let bqm = exactly_one(&[1u32, 2, 3, 4, 5], Vartype::Spin);
        let annealer = SimulatedAnnealer {
            seed: Some(3),
            ..SimulatedAnnealer::default()
        };
        let sample = annealer.sample(&bqm);
        assert_eq!(sample.assignment.len(), bqm.num_variables());
        assert_eq!(sample.energy, bqm.energy(&sample.assignment));
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let bqm = exactly_one(&[1u32, 2, 3, 4], Vartype::Binary);
        let annealer = SimulatedAnnealer {
            seed: Some(42),
            ..SimulatedAnnealer::default()
        };
        let first = annealer.sample(&bqm);
        let second = annealer.sample(&bqm);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_model_yields_the_offset() {
        let mut bqm = exactly_one(&[1u32], Vartype::Binary);
        bqm.fix_variable(1, 1);
        let sample = SimulatedAnnealer::default().sample(&bqm);
        assert!(sample.assignment.is_empty());
        assert_eq!(sample.energy, bqm.offset());
    }

    #[test]
    fn test_solves_the_four_by_four_puzzle() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();
        let encoding = encode(&grid, &EncoderConfig::default());

        let annealer = SimulatedAnnealer {
            num_reads: 50,
            num_sweeps: 2000,
            seed: Some(1234),
            ..SimulatedAnnealer::default()
        };
        let sample = annealer.sample(&encoding.model);
        assert_eq!(sample.energy, 0.0);

        let decoded = encoding.decode(&sample.assignment).unwrap();
        assert_eq!(decoded, solution);
        assert!(decoded.is_correct());
    }
}
