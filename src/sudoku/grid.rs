#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! The puzzle grid: parsing, structural validation, and the solution
//! checker.
//!
//! A [`Grid`] is an n×n matrix of values in `0..=n`, 0 meaning "blank".
//! The text form is one row per line, values separated by whitespace,
//! blank lines ignored. Construction validates the structure once (square
//! shape, perfect-square size, value range); everything downstream can
//! then rely on a well-formed grid and never mutates it.

use log::debug;
use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Structural errors raised while reading or building a grid.
///
/// All of these abort a run before any model is built.
#[derive(Debug, Error)]
pub enum GridError {
    /// The puzzle file could not be read.
    #[error("failed to read puzzle: {0}")]
    Io(#[from] std::io::Error),

    /// A token in the puzzle text is not a non-negative integer.
    #[error("line {line}: `{token}` is not a digit")]
    InvalidToken {
        /// One-based line number in the input text.
        line: usize,
        /// The offending token.
        token: String,
        /// The failed integer conversion.
        source: ParseIntError,
    },

    /// The input contained no rows at all.
    #[error("puzzle is empty")]
    Empty,

    /// A row's length does not match the number of rows.
    #[error("grid has {rows} rows but row {row} has {len} values")]
    Ragged {
        /// Total number of rows.
        rows: usize,
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of values in that row.
        len: usize,
    },

    /// The grid dimension has no integral box size.
    #[error("grid size {size} is not a perfect square")]
    NotPerfectSquare {
        /// The offending dimension.
        size: usize,
    },

    /// A cell value lies outside `0..=n`.
    #[error("value {value} at ({row}, {col}) is outside 0..={max}")]
    ValueOutOfRange {
        /// Zero-based row of the offending cell.
        row: usize,
        /// Zero-based column of the offending cell.
        col: usize,
        /// The offending value.
        value: usize,
        /// The largest admissible value (the grid size).
        max: usize,
    },
}

/// A constraint group that fails the solution check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The given zero-based row is not a permutation of `1..=n`.
    Row(usize),
    /// The given zero-based column is not a permutation of `1..=n`.
    Column(usize),
    /// The box at the given box coordinates is not a permutation of `1..=n`.
    Box {
        /// Zero-based box row, in `0..m`.
        row: usize,
        /// Zero-based box column, in `0..m`.
        col: usize,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(row) => write!(f, "row {row}"),
            Self::Column(col) => write!(f, "column {col}"),
            Self::Box { row, col } => write!(f, "box ({row}, {col})"),
        }
    }
}

/// An n×n Sudoku grid; 0 is a blank cell, `1..=n` are digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<usize>>,
    size: usize,
    box_size: usize,
}

impl Grid {
    /// Builds a grid from its rows, validating the structure.
    ///
    /// # Errors
    ///
    /// [`GridError::Empty`] for zero rows, [`GridError::Ragged`] when any
    /// row's length differs from the row count,
    /// [`GridError::NotPerfectSquare`] when the dimension has no integral
    /// box size, and [`GridError::ValueOutOfRange`] for any cell outside
    /// `0..=n`.
    pub fn new(cells: Vec<Vec<usize>>) -> Result<Self, GridError> {
        let size = cells.len();
        if size == 0 {
            return Err(GridError::Empty);
        }

        for (row, values) in cells.iter().enumerate() {
            if values.len() != size {
                return Err(GridError::Ragged {
                    rows: size,
                    row,
                    len: values.len(),
                });
            }
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
        let box_size = (size as f64).sqrt() as usize;
        if box_size * box_size != size {
            return Err(GridError::NotPerfectSquare { size });
        }

        for (row, values) in cells.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                if value > size {
                    return Err(GridError::ValueOutOfRange {
                        row,
                        col,
                        value,
                        max: size,
                    });
                }
            }
        }

        Ok(Self {
            cells,
            size,
            box_size,
        })
    }

    /// Reads a grid from a text file; see the module docs for the format.
    ///
    /// # Errors
    ///
    /// [`GridError::Io`] when the file cannot be read, otherwise any of
    /// the parsing and structural errors of [`Grid::new`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        std::fs::read_to_string(path)?.parse()
    }

    /// The grid dimension n.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// The box dimension m = √n.
    #[must_use]
    pub const fn box_size(&self) -> usize {
        self.box_size
    }

    /// The value of cell (`row`, `col`); 0 for a blank.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> usize {
        self.cells[row][col]
    }

    /// Whether cell (`row`, `col`) is blank.
    #[must_use]
    pub fn is_blank(&self, row: usize, col: usize) -> bool {
        self.value(row, col) == 0
    }

    /// The rows of the grid.
    #[must_use]
    pub fn rows(&self) -> &[Vec<usize>] {
        &self.cells
    }

    /// Number of clued (non-blank) cells.
    #[must_use]
    pub fn num_clues(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|&&value| value != 0)
            .count()
    }

    /// Checks the full Sudoku rules: every row, every column and every box
    /// must hold each of `1..=n` exactly once. Blanks and out-of-range
    /// values simply fail the check.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.first_violation().is_none()
    }

    /// The first failing constraint group, if any, for diagnostics. Groups
    /// are scanned rows, then columns, then boxes.
    #[must_use]
    pub fn first_violation(&self) -> Option<Violation> {
        let n = self.size;
        let m = self.box_size;

        for row in 0..n {
            if !self.group_is_permutation((0..n).map(|col| self.cells[row][col])) {
                debug!("row {row} is not a permutation of 1..={n}");
                return Some(Violation::Row(row));
            }
        }

        for col in 0..n {
            if !self.group_is_permutation((0..n).map(|row| self.cells[row][col])) {
                debug!("column {col} is not a permutation of 1..={n}");
                return Some(Violation::Column(col));
            }
        }

        for box_row in 0..m {
            for box_col in 0..m {
                let values = (0..n).map(|i| {
                    self.cells[box_row * m + i / m][box_col * m + i % m]
                });
                if !self.group_is_permutation(values) {
                    debug!("box ({box_row}, {box_col}) is not a permutation of 1..={n}");
                    return Some(Violation::Box {
                        row: box_row,
                        col: box_col,
                    });
                }
            }
        }

        None
    }

    fn group_is_permutation(&self, values: impl Iterator<Item = usize>) -> bool {
        let mut seen = vec![false; self.size + 1];
        for value in values {
            if value == 0 || value > self.size || seen[value] {
                return false;
            }
            seen[value] = true;
        }
        true
    }
}

impl FromStr for Grid {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = Vec::new();
        for (index, line) in s.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|token| {
                    token.parse::<usize>().map_err(|source| GridError::InvalidToken {
                        line: index + 1,
                        token: token.to_string(),
                        source,
                    })
                })
                .collect::<Result<Vec<usize>, GridError>>()?;
            cells.push(row);
        }
        Self::new(cells)
    }
}

impl Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let mut first = true;
            for value in row {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{value}")?;
                first = false;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// The diagonal-shifted Latin square: a canonical valid solution for any
/// perfect-square n. Test fixture shared across the crate.
#[cfg(test)]
pub(crate) fn canonical_solution(n: usize) -> Grid {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    let m = (n as f64).sqrt() as usize;
    let cells = (0..n)
        .map(|i| (0..n).map(|j| (i * m + i / m + j) % n + 1).collect())
        .collect();
    Grid::new(cells).unwrap()
}
