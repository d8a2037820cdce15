#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Reconstructing a grid from a solver's assignment.
//!
//! A solver returns values for the free variables of an [`Encoding`];
//! variables eliminated by clue fixing resolve to their recorded fixed
//! values. Decoding scans each cell's n candidate variables and takes the
//! single active one. A cell with zero or several active candidates is a
//! solver-quality failure and surfaces as a typed [`DecodeError`], kept
//! distinct from a validator "incorrect" verdict and never papered over
//! by leaving the cell blank.

use crate::sudoku::encoder::Encoding;
use crate::sudoku::grid::Grid;
use crate::sudoku::label::Label;
use itertools::iproduct;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Failures turning a variable assignment back into a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The assignment does not cover every free variable of the model.
    #[error("sample does not assign variable `{0}`")]
    MissingVariable(Label),

    /// No candidate digit of the cell is active.
    #[error("no digit is active for cell ({row}, {col})")]
    NoActiveDigit {
        /// Zero-based row of the undecidable cell.
        row: usize,
        /// Zero-based column of the undecidable cell.
        col: usize,
    },

    /// More than one candidate digit of the cell is active.
    #[error("{count} digits are active for cell ({row}, {col})")]
    AmbiguousCell {
        /// Zero-based row of the ambiguous cell.
        row: usize,
        /// Zero-based column of the ambiguous cell.
        col: usize,
        /// How many candidates were active.
        count: usize,
    },
}

impl Encoding {
    /// Reconstructs the solved grid from a sample over the model's free
    /// variables.
    ///
    /// # Errors
    ///
    /// [`DecodeError::MissingVariable`] when the sample does not cover the
    /// model, [`DecodeError::NoActiveDigit`] /
    /// [`DecodeError::AmbiguousCell`] when a cell has zero or several
    /// active candidates. The returned grid is structurally sound but not
    /// yet checked against the Sudoku rules; that is the validator's job.
    pub fn decode(&self, sample: &FxHashMap<Label, i8>) -> Result<Grid, DecodeError> {
        if let Some(missing) = self
            .model
            .variables()
            .find(|label| !sample.contains_key(label))
        {
            return Err(DecodeError::MissingVariable(missing));
        }

        let n = self.size;
        let active = self.model.vartype().active_value();
        let mut cells = vec![vec![0usize; n]; n];

        for (row, col) in iproduct!(0..n, 0..n) {
            let mut count = 0usize;
            let mut found = 0usize;
            for digit in 1..=n {
                let label = Label::new(row, col, digit);
                let value = self.fixed.get(&label).or_else(|| sample.get(&label));
                if value.copied() == Some(active) {
                    count += 1;
                    found = digit;
                }
            }
            match count {
                0 => return Err(DecodeError::NoActiveDigit { row, col }),
                1 => cells[row][col] = found,
                _ => return Err(DecodeError::AmbiguousCell { row, col, count }),
            }
        }

        Ok(Grid::new(cells).expect("decoded cells form a well-shaped grid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::Vartype;
    use crate::sudoku::encoder::{ClueFixing, EncoderConfig, encode};
    use crate::sudoku::{EXAMPLE_FOUR, EXAMPLE_FOUR_SOLUTION, grid_from_array};

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
    fn test_end_to_end_four_by_four() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();

        for (vartype, fixing) in [
            (Vartype::Binary, ClueFixing::CluesOnly),
            (Vartype::Binary, ClueFixing::PropagatePeers),
            (Vartype::Spin, ClueFixing::CluesOnly),
            (Vartype::Spin, ClueFixing::PropagatePeers),
        ] {
            let encoding = encode(&grid, &EncoderConfig { vartype, fixing });
            assert_eq!(encoding.num_variables() + encoding.num_fixed(), 64);

            let sample = sample_from_solution(&encoding, &solution);
            assert_eq!(encoding.model.energy(&sample), 0.0);

            let decoded = encoding.decode(&sample).unwrap();
            assert_eq!(decoded, solution);
            assert!(decoded.is_correct());
        }
    }

    #[test]
    fn test_incomplete_sample_is_an_error() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let encoding = encode(&grid, &EncoderConfig::default());
        let result = encoding.decode(&FxHashMap::default());
        assert!(matches!(result, Err(DecodeError::MissingVariable(_))));
    }

    #[test]
    fn test_cell_with_no_active_digit_is_an_error_not_a_blank() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();
        let encoding = encode(&grid, &EncoderConfig {
            vartype: Vartype::Binary,
            fixing: ClueFixing::CluesOnly,
        });

        // Cell (1, 0) is blank in the puzzle and holds 2 in the solution;
        // deactivating that variable leaves the cell with nothing active.
        let mut sample = sample_from_solution(&encoding, &solution);
        sample.insert(Label::new(1, 0, 2), 0);
        assert_eq!(
            encoding.decode(&sample),
            Err(DecodeError::NoActiveDigit { row: 1, col: 0 })
        );
    }

    #[test]
    fn test_cell_with_two_active_digits_is_an_error() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();
        let encoding = encode(&grid, &EncoderConfig {
            vartype: Vartype::Binary,
            fixing: ClueFixing::CluesOnly,
        });

        let mut sample = sample_from_solution(&encoding, &solution);
        sample.insert(Label::new(1, 0, 3), 1);
        assert_eq!(
            encoding.decode(&sample),
            Err(DecodeError::AmbiguousCell { row: 1, col: 0, count: 2 })
        );
    }

    #[test]
    fn test_wrong_but_unambiguous_sample_decodes_and_fails_validation() {
        let grid = grid_from_array(EXAMPLE_FOUR).unwrap();
        let solution = grid_from_array(EXAMPLE_FOUR_SOLUTION).unwrap();
        let encoding = encode(&grid, &EncoderConfig {
            vartype: Vartype::Binary,
            fixing: ClueFixing::CluesOnly,
        });

        // One digit per cell everywhere, but cell (1, 0) holds the wrong
        // one: decoding succeeds and the validator rejects the grid.
        let mut sample = sample_from_solution(&encoding, &solution);
        sample.insert(Label::new(1, 0, 2), 0);
        sample.insert(Label::new(1, 0, 3), 1);

        let decoded = encoding.decode(&sample).unwrap();
        assert_eq!(decoded.value(1, 0), 3);
        assert!(!decoded.is_correct());
    }
}
