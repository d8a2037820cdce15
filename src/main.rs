//! # qubo-sudoku
//!
//! `qubo-sudoku` is a command-line Sudoku solver that works by encoding
//! the puzzle as a binary quadratic model (the objective form consumed by
//! annealing hardware and heuristics) and minimizing it with a local
//! simulated annealer.
//!
//! Each puzzle is turned into `n^3` decision variables "cell (row, col)
//! holds digit", constrained by one-hot penalties over every cell, row,
//! column and box; clues are substituted out of the model before solving.
//! The best sample is decoded back into a grid and verified against the
//! Sudoku rules.
//!
//! ## Usage
//!
//! ```sh
//! # Solve a puzzle (one row per line, 0 for blanks)
//! qubo-sudoku problem.txt
//!
//! # Solve with an explicit domain and clue handling, reproducibly
//! qubo-sudoku solve --path problem.txt --vartype binary --fixing clues --seed 7
//!
//! # Solve every .txt puzzle under a directory
//! qubo-sudoku dir --path puzzles/
//!
//! # Export the encoded model without solving it
//! qubo-sudoku encode --path problem.txt --output problem.coo
//!
//! # Verify an already-completed grid
//! qubo-sudoku check --path solution.txt
//! ```
//!
//! Logging is controlled through `RUST_LOG` (e.g. `RUST_LOG=debug` traces
//! assembly, clue fixing and per-read annealing energies).

use clap::{CommandFactory, Parser};
use command_line::cli::{self, Cli, Commands};

mod command_line;

/// Global allocator using `tikv-jemallocator`, matching the memory usage
/// figures reported in the statistics tables.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Main entry point: parses command-line arguments and dispatches to the
/// appropriate handler.
fn main() {
    env_logger::init();

    let cli = Cli::parse();

    // A bare path without a subcommand solves that puzzle.
    if let Some(path) = cli.puzzle.clone() {
        if cli.command.is_none() {
            finish(cli::solve_puzzle(&path, false, &cli.common));
            return;
        }
    }

    match cli.command {
        Some(Commands::Solve {
            path,
            export_coo,
            common,
        }) => finish(cli::solve_puzzle(&path, export_coo, &common)),
        Some(Commands::Dir { path, common }) => finish(cli::solve_dir(&path, &common)),
        Some(Commands::Encode {
            path,
            output,
            common,
        }) => finish(cli::encode_puzzle(&path, output.as_deref(), &common)),
        Some(Commands::Check { path }) => finish(cli::check_grid(&path)),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "qubo-sudoku",
                &mut std::io::stdout(),
            );
        }
        None => {
            eprintln!("No command provided. Use --help for more information.");
            std::process::exit(1);
        }
    }
}

/// Reports a handler failure on stderr and exits non-zero.
fn finish(result: Result<(), String>) {
    if let Err(message) = result {
        eprintln!("{message}");
        std::process::exit(1);
    }
}
