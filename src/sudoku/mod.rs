#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Sudoku puzzles: the grid, the variable labeling, the encoder that turns
//! a puzzle into a binary quadratic model, and the decoder that turns a
//! solver's answer back into a grid.

pub mod decode;
pub mod encoder;
pub mod grid;
pub mod label;

pub use decode::DecodeError;
pub use encoder::{ClueFixing, EncoderConfig, Encoding, apply_clues, assemble, encode};
pub use grid::{Grid, GridError, Violation};
pub use label::{Label, ParseLabelError};

/// A 4×4 puzzle with a unique completion.
pub const EXAMPLE_FOUR: [[usize; 4]; 4] = [[1, 0, 0, 4], [0, 0, 1, 0], [0, 1, 0, 0], [4, 0, 0, 1]];

/// The unique completion of [`EXAMPLE_FOUR`].
pub const EXAMPLE_FOUR_SOLUTION: [[usize; 4]; 4] =
    [[1, 3, 2, 4], [2, 4, 1, 3], [3, 1, 4, 2], [4, 2, 3, 1]];

/// A 9×9 example puzzle.
pub const EXAMPLE_NINE: [[usize; 9]; 9] = [
    [5, 3, 0, 0, 7, 0, 0, 0, 0],
    [6, 0, 0, 1, 9, 5, 0, 0, 0],
    [0, 9, 8, 0, 0, 0, 0, 6, 0],
    [8, 0, 0, 0, 6, 0, 0, 0, 3],
    [4, 0, 0, 8, 0, 3, 0, 0, 1],
    [7, 0, 0, 0, 2, 0, 0, 0, 6],
    [0, 6, 0, 0, 0, 0, 2, 8, 0],
    [0, 0, 0, 4, 1, 9, 0, 0, 5],
    [0, 0, 0, 0, 8, 0, 0, 7, 9],
];

/// Builds a [`Grid`] from a fixed-size array literal.
///
/// # Errors
///
/// The structural errors of [`Grid::new`] (in practice only
/// [`GridError::NotPerfectSquare`] and [`GridError::ValueOutOfRange`],
/// since the array shape is square by construction).
pub fn grid_from_array<const N: usize>(cells: [[usize; N]; N]) -> Result<Grid, GridError> {
    Grid::new(cells.iter().map(|row| row.to_vec()).collect())
}
