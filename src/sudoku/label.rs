#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Decision-variable labels.
//!
//! Every decision variable of the encoding stands for one statement of the
//! form "cell (row, col) holds `digit`". [`Label`] is the identifier for
//! that statement: a cheap `Copy` triple with a canonical textual form
//! `"row,col_digit"` (the form external tools see in COO exports and
//! sample files). The triple itself makes the mapping injective, and
//! parsing the textual form back is the exact inverse of rendering it.

use std::fmt::{self, Display};
use std::num::ParseIntError;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of the decision variable "cell (`row`, `col`) holds `digit`".
///
/// Rows and columns are zero-based, digits range over `1..=n`. Labels are
/// only ever produced by [`Label::new`] over that domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    row: usize,
    col: usize,
    digit: usize,
}

impl Label {
    /// Creates the label for "cell (`row`, `col`) holds `digit`".
    #[must_use]
    pub const fn new(row: usize, col: usize, digit: usize) -> Self {
        Self { row, col, digit }
    }

    /// Zero-based row index.
    #[must_use]
    pub const fn row(self) -> usize {
        self.row
    }

    /// Zero-based column index.
    #[must_use]
    pub const fn col(self) -> usize {
        self.col
    }

    /// The digit, in `1..=n`.
    #[must_use]
    pub const fn digit(self) -> usize {
        self.digit
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}_{}", self.row, self.col, self.digit)
    }
}

/// Error returned when a string is not a well-formed variable label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLabelError {
    /// The string is not of the shape `row,col_digit`.
    #[error("label `{0}` is not of the form `row,col_digit`")]
    Format(String),

    /// A component of the label is not an integer.
    #[error("label `{label}` has a non-numeric component")]
    Integer {
        /// The offending label.
        label: String,
        /// The failed integer conversion.
        source: ParseIntError,
    },
}

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cell, digit) = s
            .split_once('_')
            .ok_or_else(|| ParseLabelError::Format(s.to_string()))?;
        let (row, col) = cell
            .split_once(',')
            .ok_or_else(|| ParseLabelError::Format(s.to_string()))?;

        let parse = |part: &str| {
            part.parse::<usize>().map_err(|source| ParseLabelError::Integer {
                label: s.to_string(),
                source,
            })
        };

        Ok(Self::new(parse(row)?, parse(col)?, parse(digit)?))
    }
}
