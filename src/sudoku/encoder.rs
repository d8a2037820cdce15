#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Encoding a puzzle as a binary quadratic model.
//!
//! Sudoku is four families of exactly-one constraints over the variables
//! "cell (row, col) holds digit": each cell holds one digit, each digit
//! appears once per row, once per column and once per box. The assembler
//! enumerates all `4 * n^2` groups, builds a one-hot penalty sub-model for
//! each and merges them into one accumulator; a valid solution is then
//! precisely a ground state at energy zero. Clues are applied afterwards by
//! fixing their variables to the active value, which substitutes them out
//! of the model entirely.

use crate::qubo::{BinaryQuadraticModel, Vartype, exactly_one};
use crate::sudoku::grid::Grid;
use crate::sudoku::label::Label;
use itertools::iproduct;
use log::debug;
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::str::FromStr;
use thiserror::Error;

/// A constraint group's variables. Groups have exactly n members.
type Group = SmallVec<[Label; 16]>;

/// How aggressively clues are substituted out of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClueFixing {
    /// Fix only the clue variables themselves to the active value. This is
    /// sufficient for correctness: the one-hot penalties already price out
    /// every assignment that co-activates a conflicting digit.
    CluesOnly,

    /// Additionally fix the same-digit variables of still-blank cells in
    /// the clue's row, column and box to the inactive value. Those
    /// variables are forced anyway, so this shrinks the model without
    /// changing its ground states.
    #[default]
    PropagatePeers,
}

impl Display for ClueFixing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CluesOnly => write!(f, "clues"),
            Self::PropagatePeers => write!(f, "peers"),
        }
    }
}

/// Error returned when parsing a [`ClueFixing`] from a string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown fixing mode `{0}`, expected `clues` or `peers`")]
pub struct ParseClueFixingError(String);

impl FromStr for ClueFixing {
    type Err = ParseClueFixingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clues" | "clues-only" => Ok(Self::CluesOnly),
            "peers" | "propagate" => Ok(Self::PropagatePeers),
            _ => Err(ParseClueFixingError(s.to_string())),
        }
    }
}

/// Configuration of one encoding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncoderConfig {
    /// The two-valued domain the model is built over.
    pub vartype: Vartype,
    /// The clue-substitution behavior.
    pub fixing: ClueFixing,
}

/// The result of encoding a puzzle: the reduced model handed to a solver,
/// plus everything needed to reconstruct a grid from its answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Encoding {
    /// The final model, after clue fixing.
    pub model: BinaryQuadraticModel<Label>,
    /// The variables substituted out during clue fixing, with the values
    /// they were fixed to.
    pub fixed: BTreeMap<Label, i8>,
    /// The grid dimension n.
    pub size: usize,
}

impl Encoding {
    /// Number of free variables remaining in the model.
    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.model.num_variables()
    }

    /// Number of variables eliminated by clue fixing.
    #[must_use]
    pub fn num_fixed(&self) -> usize {
        self.fixed.len()
    }
}

fn cell_groups(n: usize) -> Vec<Group> {
    iproduct!(0..n, 0..n)
        .map(|(row, col)| (1..=n).map(|digit| Label::new(row, col, digit)).collect())
        .collect()
}

fn row_groups(n: usize) -> Vec<Group> {
    iproduct!(0..n, 1..=n)
        .map(|(row, digit)| (0..n).map(|col| Label::new(row, col, digit)).collect())
        .collect()
}

fn column_groups(n: usize) -> Vec<Group> {
    iproduct!(0..n, 1..=n)
        .map(|(col, digit)| (0..n).map(|row| Label::new(row, col, digit)).collect())
        .collect()
}

fn box_groups(n: usize, m: usize) -> Vec<Group> {
    iproduct!(0..m, 0..m, 1..=n)
        .map(|(box_row, box_col, digit)| {
            iproduct!(0..m, 0..m)
                .map(|(row, col)| Label::new(box_row * m + row, box_col * m + col, digit))
                .collect()
        })
        .collect()
}

/// Builds the raw model for an n×n grid with box size m, before any clue
/// is applied: the merged one-hot penalties of all `4 * n^2` constraint
/// groups, over `n^3` variables.
///
/// Merging is commutative and associative, so the result does not depend
/// on the order; groups are still merged in a fixed order (cells, rows,
/// columns, boxes, each row-major) for reproducibility.
#[must_use]
pub fn assemble(n: usize, m: usize, vartype: Vartype) -> BinaryQuadraticModel<Label> {
    debug_assert_eq!(m * m, n);

    let mut bqm = BinaryQuadraticModel::new(vartype);
    let groups = cell_groups(n)
        .into_iter()
        .chain(row_groups(n))
        .chain(column_groups(n))
        .chain(box_groups(n, m));

    let mut num_groups = 0usize;
    for group in groups {
        bqm.update(exactly_one(&group, vartype));
        num_groups += 1;
    }

    debug!("assembled {num_groups} one-hot groups into {bqm}");
    bqm
}

/// Substitutes the grid's clues out of `bqm` and returns the map of fixed
/// variables and their values.
///
/// Every clue's own variable is fixed to the active value; with
/// [`ClueFixing::PropagatePeers`] the same digit is also fixed inactive in
/// every still-blank cell sharing the clue's row, column or box. The fixes
/// are collected first (deduplicated) and applied in label order; fixing
/// is confluent, so the order is only for reproducibility.
pub fn apply_clues(
    bqm: &mut BinaryQuadraticModel<Label>,
    grid: &Grid,
    fixing: ClueFixing,
) -> BTreeMap<Label, i8> {
    let n = grid.size();
    let m = grid.box_size();
    let active = bqm.vartype().active_value();
    let inactive = bqm.vartype().inactive_value();

    let mut fixes: BTreeMap<Label, i8> = BTreeMap::new();
    for (row, col) in iproduct!(0..n, 0..n) {
        let digit = grid.value(row, col);
        if digit == 0 {
            continue;
        }

        fixes.insert(Label::new(row, col, digit), active);

        if fixing == ClueFixing::PropagatePeers {
            for c in (0..n).filter(|&c| grid.is_blank(row, c)) {
                fixes.insert(Label::new(row, c, digit), inactive);
            }
            for r in (0..n).filter(|&r| grid.is_blank(r, col)) {
                fixes.insert(Label::new(r, col, digit), inactive);
            }
            let (box_row, box_col) = (row / m * m, col / m * m);
            for (r, c) in iproduct!(box_row..box_row + m, box_col..box_col + m) {
                if grid.is_blank(r, c) {
                    fixes.insert(Label::new(r, c, digit), inactive);
                }
            }
        }
    }

    for (&label, &value) in &fixes {
        bqm.fix_variable(label, value);
    }

    debug!(
        "fixed {} of {} variables ({fixing}), {} remain",
        fixes.len(),
        fixes.len() + bqm.num_variables(),
        bqm.num_variables()
    );
    fixes
}

/// Encodes a puzzle: assembles the raw model and applies the clues.
#[must_use]
pub fn encode(grid: &Grid, config: &EncoderConfig) -> Encoding {
    let mut model = assemble(grid.size(), grid.box_size(), config.vartype);
    let fixed = apply_clues(&mut model, grid, config.fixing);
    Encoding {
        model,
        fixed,
        size: grid.size(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sudoku::{EXAMPLE_FOUR, EXAMPLE_FOUR_SOLUTION, grid_from_array};
    use rustc_hash::FxHashMap;

    /// Assigns every free variable of `encoding` the value it takes in the
    /// solved grid.
    fn sample_from_solution(encoding: &Encoding, solution: &Grid) -> FxHashMap<Label, i8> {
        let vartype = encoding.model.vartype();
        encoding
            .model
            .variables()
            .map(|label| {
                let value = if solution.value(label.row(), label.col()) == label.digit() {
                    vartype.active_value()
                } else {
                    vartype.inactive_value()
                };
                (label, value)
            })
            .collect()
    }

    #[test]
    fn test_four_families_of_n_squared_groups() {
        for n in [4usize, 9] {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
            let m = (n as f64).sqrt() as usize;
            let families = [
                cell_groups(n),
                row_groups(n),
                column_groups(n),
                box_groups(n, m),
            ];
            for family in &families {
                assert_eq!(family.len(), n * n);
                assert!(family.iter().all(|group| group.len() == n));
            }
            assert_eq!(families.iter().map(Vec::len).sum::<usize>(), 4 * n * n);
        }
    }

    #[test]
    fn test_every_variable_is_in_exactly_four_groups() {
        let n = 4;
        let mut seen: FxHashMap<Label, usize> = FxHashMap::default();
        for group in cell_groups(n)
            .into_iter()
            .chain(row_groups(n))
            .chain(column_groups(n))
            .chain(box_groups(n, 2))
        {
            for label in group {
                *seen.entry(label).or_insert(0) += 1;
            }
        }
        assert_eq!(seen.len(), n * n * n);
        assert!(seen.values().all(|&count| count == 4));
    }

    #[test]
    fn test_assemble_has_n_cubed_variables() {
        assert_eq!(assemble(4, 2, Vartype::Binary).num_variables(), 64);
        assert_eq!(assemble(9, 3, Vartype::Spin).num_variables(), 729);
    }

    #[test]
    fn test_solution_is_a_ground_state_in_both_domains() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();

        for vartype in [Vartype::Binary, Vartype::Spin] {
            let config = EncoderConfig {
                vartype,
                fixing: ClueFixing::CluesOnly,
            };
            let encoding = encode(&grid, &config);
            let sample = sample_from_solution(&encoding, &solution);
            assert_eq!(
                encoding.model.energy(&sample),
                0.0,
                "the unique completion must sit at energy zero ({vartype})"
            );
        }
    }

    #[test]
    fn test_conflicting_assignment_costs_at_least_the_gap() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();
        let encoding = encode(&grid, &EncoderConfig {
            vartype: Vartype::Binary,
            fixing: ClueFixing::CluesOnly,
        });

        // Move cell (1, 0) from its correct digit 2 to 3: still one digit
        // per cell, but 3 now repeats in row 1.
        let mut sample = sample_from_solution(&encoding, &solution);
        sample.insert(Label::new(1, 0, 2), 0);
        sample.insert(Label::new(1, 0, 3), 1);
        assert!(encoding.model.energy(&sample) >= 1.0);
    }

    #[test]
    fn test_clue_fixing_is_confluent() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let mut reference = assemble(4, 2, Vartype::Spin);
        let fixes = apply_clues(&mut reference, &grid, ClueFixing::PropagatePeers);

        // The same fixes in reverse and in an interleaved order must
        // produce float-for-float the same model.
        let ascending: Vec<(Label, i8)> = fixes.iter().map(|(&l, &v)| (l, v)).collect();
        let mut descending = ascending.clone();
        descending.reverse();
        let interleaved: Vec<(Label, i8)> = ascending
            .iter()
            .skip(1)
            .step_by(2)
            .chain(ascending.iter().step_by(2))
            .copied()
            .collect();

        for order in [descending, interleaved] {
            let mut model = assemble(4, 2, Vartype::Spin);
            model.fix_variables(order);
            assert_eq!(model, reference);
        }
    }

    #[test]
    fn test_peer_propagation_shrinks_the_model_and_keeps_the_ground_state() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();

        let clues_only = encode(&grid, &EncoderConfig {
            vartype: Vartype::Spin,
            fixing: ClueFixing::CluesOnly,
        });
        let peers = encode(&grid, &EncoderConfig {
            vartype: Vartype::Spin,
            fixing: ClueFixing::PropagatePeers,
        });

        assert_eq!(clues_only.num_fixed(), grid.num_clues());
        assert!(peers.num_variables() < clues_only.num_variables());
        assert_eq!(peers.num_variables() + peers.num_fixed(), 64);

        let sample = sample_from_solution(&peers, &solution);
        assert_eq!(peers.model.energy(&sample), 0.0);
    }

    #[test]
    fn test_fixed_variables_leave_the_model() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let encoding = encode(&grid, &EncoderConfig::default());

        for (label, &value) in &encoding.fixed {
            assert!(!encoding.model.contains_variable(label));
            if grid.value(label.row(), label.col()) == label.digit() {
                assert_eq!(value, encoding.model.vartype().active_value());
            } else {
                assert_eq!(value, encoding.model.vartype().inactive_value());
            }
        }
    }

    #[test]
    fn test_clue_fixing_parsing() {
        assert_eq!("peers".parse::<ClueFixing>(), Ok(ClueFixing::PropagatePeers));
        assert_eq!("clues".parse::<ClueFixing>(), Ok(ClueFixing::CluesOnly));
        assert!("everything".parse::<ClueFixing>().is_err());
    }
}
