#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
//! Quadratic models over two-valued variables and their penalty generators.

pub mod combinations;
pub mod model;

pub use combinations::{combinations, exactly_one};
pub use model::{BinaryQuadraticModel, ParseVartypeError, Vartype};
