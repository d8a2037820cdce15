//! The command-line surface: argument definitions and the handlers the
//! binary dispatches to.

use clap::{Args, Parser, Subcommand};
use qubo_sudoku::anneal::{Sample, Sampler, SimulatedAnnealer};
use qubo_sudoku::qubo::Vartype;
use qubo_sudoku::sudoku::{ClueFixing, EncoderConfig, Encoding, Grid, Label, encode};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

/// Defines the command-line interface for the solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "qubo-sudoku",
    version,
    about = "Encodes Sudoku puzzles as binary quadratic models and solves them by simulated annealing"
)]
pub(crate) struct Cli {
    /// An optional global path argument. If provided without a subcommand,
    /// it's treated as the path to a puzzle file to solve.
    #[arg(global = true, value_name = "PUZZLE")]
    pub(crate) puzzle: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `solve`, `dir`, `encode`,
    /// `check`).
    #[clap(subcommand)]
    pub(crate) command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub(crate) common: CommonOptions,
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a puzzle file: encode, anneal, decode, verify.
    Solve {
        /// Path to the puzzle file: one row per line, values separated by
        /// whitespace, 0 for a blank cell, blank lines ignored.
        #[arg(long)]
        path: PathBuf,

        /// If true, the final model is also written next to the puzzle as
        /// a `.coo` file.
        #[arg(short, long, default_value_t = false)]
        export_coo: bool,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.txt` puzzle under a directory.
    Dir {
        /// Path to the directory to walk.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Encode a puzzle and export the final model without solving it.
    Encode {
        /// Path to the puzzle file.
        #[arg(long)]
        path: PathBuf,

        /// Where to write the COO text; stdout if omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Check a completed grid against the Sudoku rules.
    Check {
        /// Path to the completed grid file.
        #[arg(long)]
        path: PathBuf,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across subcommands.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug output, printing the model summary and annealing
    /// parameters before solving.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Enable verification of the decoded grid against the Sudoku rules.
    #[arg(short, long, default_value_t = true)]
    pub(crate) verify: bool,

    /// Enable printing of problem and annealing statistics after solving.
    #[arg(short, long, default_value_t = true)]
    pub(crate) stats: bool,

    /// Enable printing of the final model in COO text form.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_model: bool,

    /// The two-valued domain the model is built over.
    #[arg(long, default_value_t = Vartype::Spin)]
    pub(crate) vartype: Vartype,

    /// How aggressively clues are substituted out of the model:
    /// `clues` fixes only the clue variables, `peers` also fixes the
    /// same-digit variables of blank cells sharing a row, column or box.
    #[arg(long, default_value_t = ClueFixing::PropagatePeers)]
    pub(crate) fixing: ClueFixing,

    /// Number of independent annealing restarts.
    #[arg(long, default_value_t = 10)]
    pub(crate) reads: usize,

    /// Number of sweeps per restart.
    #[arg(long, default_value_t = 1000)]
    pub(crate) sweeps: usize,

    /// RNG seed for reproducible runs; fresh entropy if omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
}

impl CommonOptions {
    fn annealer(&self) -> SimulatedAnnealer {
        SimulatedAnnealer {
            num_reads: self.reads,
            num_sweeps: self.sweeps,
            seed: self.seed,
            ..SimulatedAnnealer::default()
        }
    }
}

/// Solve a puzzle file.
///
/// # Errors
///
/// If the puzzle cannot be read or parsed, or the sample cannot be decoded
/// into a grid.
pub(crate) fn solve_puzzle(
    path: &Path,
    export_coo: bool,
    common: &CommonOptions,
) -> Result<(), String> {
    if !path.is_file() {
        return Err(format!("Puzzle file does not exist: {}", path.display()));
    }

    let time = Instant::now();
    let grid = Grid::from_file(path)
        .map_err(|e| format!("Error parsing puzzle file {}: {e}", path.display()))?;
    println!("Parsed puzzle:\n{grid}");

    let config = EncoderConfig {
        vartype: common.vartype,
        fixing: common.fixing,
    };
    let encoding = encode(&grid, &config);
    let parse_time = time.elapsed();

    if common.debug {
        println!("Model: {}", encoding.model);
        println!("Annealer: {:?}", common.annealer());
    }

    if common.print_model {
        print!("{}", encoding.model.to_coo());
    }

    if export_coo {
        let coo_path = format!("{}.coo", path.display());
        std::fs::write(&coo_path, encoding.model.to_coo())
            .map_err(|e| format!("Unable to write {coo_path}: {e}"))?;
        println!("Model written to: {coo_path}");
    }

    let anneal_start = Instant::now();
    let sample = common.annealer().sample(&encoding.model);
    let anneal_time = anneal_start.elapsed();

    epoch::advance().unwrap();
    let allocated_bytes = stats::allocated::mib().unwrap().read().unwrap();
    let resident_bytes = stats::resident::mib().unwrap().read().unwrap();
    #[allow(clippy::cast_precision_loss)]
    let allocated_mib = allocated_bytes as f64 / (1024.0 * 1024.0);
    #[allow(clippy::cast_precision_loss)]
    let resident_mib = resident_bytes as f64 / (1024.0 * 1024.0);

    if common.stats {
        print_stats(
            parse_time,
            anneal_time,
            &grid,
            &encoding,
            &sample,
            allocated_mib,
            resident_mib,
            common,
        );
    }

    let solution = encoding
        .decode(&sample.assignment)
        .map_err(|e| format!("Decoding failed: {e}"))?;
    println!("Solution:\n{solution}");
    println!("model energy: {}", sample.energy);

    if common.verify {
        match solution.first_violation() {
            None => println!("The solution is correct"),
            Some(violation) => println!("The solution is incorrect: {violation} fails"),
        }
    }

    Ok(())
}

/// Solves every `.txt` puzzle under a directory.
///
/// # Errors
///
/// If the path is not a directory, or any contained puzzle fails.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<(), String> {
    if !path.is_dir() {
        return Err(format!("Provided path is not a directory: {}", path.display()));
    }

    for entry in walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }
        if file_path.extension().is_none_or(|ext| ext != "txt") {
            eprintln!("Skipping non-puzzle file: {}", file_path.display());
            continue;
        }
        solve_puzzle(file_path, false, common)?;
    }

    Ok(())
}

/// Encodes a puzzle and writes the final model as COO text.
///
/// # Errors
///
/// If the puzzle cannot be read or parsed, or the output cannot be written.
pub(crate) fn encode_puzzle(
    path: &Path,
    output: Option<&Path>,
    common: &CommonOptions,
) -> Result<(), String> {
    let grid = Grid::from_file(path)
        .map_err(|e| format!("Error parsing puzzle file {}: {e}", path.display()))?;

    let config = EncoderConfig {
        vartype: common.vartype,
        fixing: common.fixing,
    };
    let encoding = encode(&grid, &config);
    println!("{}", encoding.model);

    let coo = encoding.model.to_coo();
    match output {
        Some(out) => {
            std::fs::write(out, coo)
                .map_err(|e| format!("Unable to write {}: {e}", out.display()))?;
            println!("Model written to: {}", out.display());
        }
        None => print!("{coo}"),
    }

    Ok(())
}

/// Checks a completed grid against the Sudoku rules.
///
/// # Errors
///
/// If the grid cannot be read or parsed, or the check fails.
pub(crate) fn check_grid(path: &Path) -> Result<(), String> {
    let grid = Grid::from_file(path)
        .map_err(|e| format!("Error parsing grid file {}: {e}", path.display()))?;

    match grid.first_violation() {
        None => {
            println!("The solution is correct");
            Ok(())
        }
        Some(violation) => Err(format!("The solution is incorrect: {violation} fails")),
    }
}

/// Helper function to print a single statistic line in a formatted table
/// row.
fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate
/// (value/second).
fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    #[allow(clippy::cast_precision_loss)]
    let rate = if elapsed > 0.0 { value as f64 / elapsed } else { 0.0 };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and annealing statistics.
#[allow(clippy::too_many_arguments)]
fn print_stats(
    parse_time: Duration,
    anneal_time: Duration,
    grid: &Grid,
    encoding: &Encoding,
    sample: &Sample<Label>,
    allocated: f64,
    resident: f64,
    common: &CommonOptions,
) {
    let n = grid.size();
    let elapsed_secs = anneal_time.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Grid size", n);
    stat_line("Box size", grid.box_size());
    stat_line("Clues", grid.num_clues());
    stat_line("Variables (raw)", n * n * n);
    stat_line("Variables (fixed)", encoding.num_fixed());
    stat_line("Variables (free)", encoding.num_variables());
    stat_line("Interactions", encoding.model.num_interactions());
    stat_line("Vartype", common.vartype);
    stat_line("Fixing", common.fixing);

    println!("=======================[ Annealing Statistics ]======================");
    stat_line("Reads", common.reads);
    stat_line_with_rate("Sweeps", common.reads * common.sweeps, elapsed_secs);
    stat_line("Best energy", sample.energy);
    stat_line("Anneal time (s)", format!("{elapsed_secs:.3}"));
    stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
    stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    println!("=====================================================================");
}
