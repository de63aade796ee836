//! antwar CLI - run, batch and replay ant-colony matches headlessly.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// antwar - a deterministic ant-colony strategy simulation
#[derive(Parser, Debug)]
#[command(name = "antwar")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single match
    Run {
        /// Scenario JSON file (default: generated arena)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Colonies in a generated arena (2-4)
        #[arg(short, long, default_value = "2")]
        colonies: usize,

        /// Rule preset (default: the scenario's)
        #[arg(long)]
        variant: Option<cli::VariantArg>,

        /// TOML rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum ticks
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Output format: text, json, or table
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Suppress the match banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded match
    Replay {
        /// Recording file (.json)
        #[arg(required = true)]
        recording: PathBuf,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::ReplayFormat,

        /// Stop at a specific tick (default: the end)
        #[arg(short, long)]
        tick: Option<u64>,

        /// Print a frame every N ticks
        #[arg(short, long)]
        every: Option<u64>,
    },

    /// Run mass parallel matches and aggregate statistics
    Tournament {
        /// Scenario JSON file (default: generated arena)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Colonies in a generated arena (2-4)
        #[arg(short, long, default_value = "2")]
        colonies: usize,

        /// Rule preset (default: the scenario's)
        #[arg(long)]
        variant: Option<cli::VariantArg>,

        /// TOML rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each match)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Maximum ticks per match
        #[arg(short = 't', long)]
        ticks: Option<u64>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Check a scenario file and give it a trial run
    Validate {
        /// Scenario JSON file
        #[arg(required = true)]
        scenario: PathBuf,

        /// TOML rules file
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Ticks to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Seed for the trial run
        #[arg(short, long, default_value = "1")]
        seed: u64,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Run {
            scenario,
            colonies,
            variant,
            rules,
            seed,
            ticks,
            format,
            save,
            quiet,
        } => {
            let setup = cli::Setup {
                scenario: scenario.as_deref(),
                colonies,
                variant: variant.map(Into::into),
                rules: rules.as_deref(),
                ticks,
            };
            cli::run::execute(&setup, seed, format, save.as_deref(), quiet)
        }

        Commands::Replay {
            recording,
            format,
            tick,
            every,
        } => cli::replay::execute(&recording, format, tick, every),

        Commands::Tournament {
            scenario,
            colonies,
            variant,
            rules,
            games,
            seed,
            threads,
            ticks,
            format,
            progress,
        } => {
            let setup = cli::Setup {
                scenario: scenario.as_deref(),
                colonies,
                variant: variant.map(Into::into),
                rules: rules.as_deref(),
                ticks,
            };
            cli::tournament::execute(&setup, games, seed, threads, format, progress)
        }

        Commands::Validate {
            scenario,
            rules,
            ticks,
            seed,
        } => cli::validate::execute(&scenario, rules.as_deref(), ticks, seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
