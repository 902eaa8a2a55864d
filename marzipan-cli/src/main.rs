//! Command-line front end for running CoreWar matches with the
//! `corewar-sim` MARS engine and the `redcode-parser` compiler.
//!
//! Deliberately thin: argument parsing, file I/O, and result formatting only.
//! All match logic lives in `corewar-sim`; all compilation lives in
//! `redcode-parser`.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use corewar_sim::config::{ConfigError, SimulatorConfig};
use corewar_sim::orchestration::run_rounds;
use rand::thread_rng;
use redcode::{Standard, WarriorData};
use redcode_parser::{compile, CompileConfig, CompileError, ParseOptions};
use thiserror::Error;

/// `marzipan-cli`: assemble and run CoreWar redcode warriors.
#[derive(Parser, Debug)]
#[command(name = "marzipan-cli", about = "Run CoreWar redcode warriors against each other")]
struct Cli {
    /// Path to the first warrior's source (or loadfile, with `--loadfile`).
    warrior1: PathBuf,
    /// Path to an optional second warrior.
    warrior2: Option<PathBuf>,

    /// Use the ICWS'88 standard (equivalent to `--preset 88` unless
    /// overridden below).
    #[arg(short = '8')]
    icws88: bool,

    /// Named configuration preset; see `corewar_sim::config::SimulatorConfig::preset`.
    #[arg(long = "preset", default_value = "nop94")]
    preset: String,

    /// Override the core size (`M`).
    #[arg(short = 's', long = "size")]
    size: Option<u32>,

    /// Override the maximum process count per warrior.
    #[arg(short = 'p', long = "procs")]
    procs: Option<u32>,

    /// Override the per-round cycle limit.
    #[arg(short = 'c', long = "cycles")]
    cycles: Option<u64>,

    /// Override the maximum warrior length.
    #[arg(short = 'l', long = "length")]
    length: Option<u32>,

    /// Override the minimum placement distance between warriors.
    #[arg(short = 'F', long = "fixed")]
    fixed: Option<u32>,

    /// Number of rounds to play.
    #[arg(short = 'r', long = "rounds", default_value_t = 1)]
    rounds: u32,

    /// Assemble only; report success or failure without running a match.
    #[arg(short = 'A', long = "assemble-only")]
    assemble_only: bool,

    /// Parse warrior inputs as pre-assembled loadfiles instead of Redcode
    /// source.
    #[arg(long = "loadfile")]
    loadfile: bool,
}

/// Everything that can go wrong running the CLI, with an opaque message for
/// the I/O and parse-failure cases the binary doesn't need to match on.
#[derive(Debug, Error)]
enum CliError {
    /// A warrior file could not be read.
    #[error("reading '{}': {source}", path.display())]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Redcode source failed to compile.
    #[error("compiling '{}': {source}", path.display())]
    Compile {
        /// The warrior file being compiled.
        path: PathBuf,
        /// The underlying compile failure.
        #[source]
        source: CompileError,
    },
    /// A loadfile failed to parse.
    #[error("parsing loadfile '{}': {message}", path.display())]
    Loadfile {
        /// The warrior file being parsed.
        path: PathBuf,
        /// A rendered description of the parse failure.
        message: String,
    },
    /// The resolved simulator configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = resolve_config(cli)?;

    let mut warrior_paths = vec![cli.warrior1.clone()];
    if let Some(second) = &cli.warrior2 {
        warrior_paths.push(second.clone());
    }

    let mut warriors = Vec::with_capacity(warrior_paths.len());
    for path in &warrior_paths {
        warriors.push(load_warrior(path, cli.loadfile, &config)?);
    }

    if cli.assemble_only {
        log::info!("assembled {} warrior(s) successfully", warriors.len());
        return Ok(());
    }

    let mut rng = thread_rng();
    let standings = run_rounds(config, &warriors, cli.rounds.max(1), &mut rng);
    for entry in &standings {
        println!("{} {}", entry.wins, entry.ties);
    }
    Ok(())
}

/// Build a [`SimulatorConfig`] from the named preset, the `-8` shorthand, and
/// any of the individual overrides the user supplied.
fn resolve_config(cli: &Cli) -> Result<SimulatorConfig, CliError> {
    let preset_name = if cli.icws88 && cli.preset == "nop94" {
        "88"
    } else {
        cli.preset.as_str()
    };
    let mut config = SimulatorConfig::preset(preset_name)?;
    if cli.icws88 {
        config.standard = Standard::Icws88;
    }
    if let Some(size) = cli.size {
        config.core_size = size;
    }
    if let Some(procs) = cli.procs {
        config.max_processes = procs;
    }
    if let Some(cycles) = cli.cycles {
        config.max_cycles = cycles;
    }
    if let Some(length) = cli.length {
        config.max_length = length;
    }
    if let Some(fixed) = cli.fixed {
        config.min_distance = fixed;
    }
    config.validate()?;
    Ok(config)
}

/// Read and compile (or parse, under `--loadfile`) one warrior file.
fn load_warrior(
    path: &PathBuf,
    loadfile: bool,
    config: &SimulatorConfig,
) -> Result<WarriorData, CliError> {
    let source = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.clone(),
        source,
    })?;

    if loadfile {
        let options = if matches!(config.standard, Standard::Icws88) {
            ParseOptions::ICWS_88_OPTIONS
        } else {
            ParseOptions::DEFAULT_OPTIONS
        };
        let relaxed = redcode_parser::parse(&source, options).map_err(|err| CliError::Loadfile {
            path: path.clone(),
            message: render_nom_error(&err),
        })?;
        return Ok(relaxed.normalize(config.core_size));
    }

    let compile_config = CompileConfig {
        standard: config.standard,
        core_size: config.core_size,
        max_length: config.max_length,
        max_processes: config.max_processes,
        min_distance: config.min_distance,
    };
    compile(&source, &compile_config).map_err(|source| CliError::Compile {
        path: path.clone(),
        source,
    })
}

/// Render a `nom` verbose error without depending on its internals beyond
/// `Debug`, since it doesn't implement `std::error::Error`.
fn render_nom_error<E: fmt::Debug>(err: &E) -> String {
    format!("{err:?}")
}
