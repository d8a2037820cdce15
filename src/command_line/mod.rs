//! Command-line parsing and dispatch for the binary.

pub(crate) mod cli;
