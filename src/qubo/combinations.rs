#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Penalty sub-models for "exactly k of these variables are active".
//!
//! The generator expands `strength * (sum(x_i) - k)^2` over binary
//! variables, where `x_i^2 = x_i` collapses the squares: each variable gets
//! the linear bias `strength * (1 - 2k)`, each unordered pair the quadratic
//! bias `2 * strength`, and the model the offset `strength * k^2`. An
//! assignment with `t` active variables then has energy
//! `strength * (t - k)^2`, so the assignments with exactly `k` active
//! variables are the unique ground states, at energy zero, and everything
//! else sits at least `strength` above them.
//!
//! With `k = 1` this is the one-hot penalty used for every Sudoku
//! constraint group.

use super::model::{BinaryQuadraticModel, Vartype};
use itertools::Itertools;
use std::hash::Hash;

/// Builds the penalty model whose ground states are exactly the
/// assignments activating `k` of `variables`.
///
/// The model is built over the binary domain and converted exactly when
/// `vartype` is [`Vartype::Spin`], so both domains share one ground-state
/// set under the `x = (s + 1) / 2` mapping. A single-variable group is
/// valid and simply pins that variable.
///
/// # Panics
///
/// If `variables` is empty or contains duplicates.
pub fn combinations<V>(
    variables: &[V],
    k: usize,
    strength: f64,
    vartype: Vartype,
) -> BinaryQuadraticModel<V>
where
    V: Copy + Eq + Hash + Ord,
{
    assert!(!variables.is_empty(), "empty constraint group");

    #[allow(clippy::cast_precision_loss)]
    let k = k as f64;

    let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
    for &v in variables {
        bqm.add_linear(v, strength * (1.0 - 2.0 * k));
    }
    for (&u, &v) in variables.iter().tuple_combinations() {
        bqm.add_quadratic(u, v, 2.0 * strength);
    }
    bqm.add_offset(strength * k * k);

    bqm.change_vartype(vartype);
    bqm
}

/// The `k = 1`, unit-strength case: exactly one of `variables` active.
pub fn exactly_one<V>(variables: &[V], vartype: Vartype) -> BinaryQuadraticModel<V>
where
    V: Copy + Eq + Hash + Ord,
{
    combinations(variables, 1, 1.0, vartype)
}
