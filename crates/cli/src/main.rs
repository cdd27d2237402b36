//! Cut list optimizer CLI

mod report;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use u_cutlist_d1::{
    is_milp_available, Error, GoodLpSolver, Nester1D, NestingConfig, NestingReport, TieBreak,
};

#[derive(Parser)]
#[command(name = "cutlist")]
#[command(about = "Kerf-aware 1D cut list optimizer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a nesting run described by a JSON file
    Solve {
        /// Path to the JSON configuration (see `cutlist sample`)
        file: PathBuf,

        #[command(flatten)]
        options: SolveOptions,
    },

    /// Print the sample configuration as JSON
    Sample,

    /// Solve the sample configuration
    Demo {
        #[command(flatten)]
        options: SolveOptions,
    },
}

#[derive(clap::Args)]
struct SolveOptions {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: FormatArg,

    /// Kerf width, overrides the file
    #[arg(short, long)]
    kerf: Option<u64>,

    /// Solver time limit in milliseconds (0 = unlimited), overrides the file
    #[arg(short, long)]
    time_limit: Option<u64>,

    /// Secondary objective among equally-valued optima, overrides the file
    #[arg(long, value_enum)]
    tie_break: Option<TieBreakArg>,

    /// Solver back-end
    #[arg(short, long, value_enum, default_value = "branch-bound")]
    solver: SolverArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum TieBreakArg {
    /// Accept the first optimum found
    None,
    /// Use as few stock pieces as possible
    FewestPieces,
    /// Consume as little offcut length as possible
    KeepLongestOffcuts,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::None => TieBreak::None,
            TieBreakArg::FewestPieces => TieBreak::FewestPieces,
            TieBreakArg::KeepLongestOffcuts => TieBreak::KeepLongestOffcuts,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SolverArg {
    /// Built-in branch-and-bound
    BranchBound,
    /// good_lp MILP back-end (requires the `milp` feature)
    GoodLp,
}

/// Installs the fmt subscriber on stderr. `RUST_LOG` overrides the default `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

impl SolveOptions {
    fn apply(&self, mut config: NestingConfig) -> NestingConfig {
        if let Some(kerf) = self.kerf {
            config = config.with_kerf_width(kerf);
        }
        if let Some(ms) = self.time_limit {
            config = config.with_time_limit_ms(ms);
        }
        if let Some(tie_break) = self.tie_break {
            config = config.with_tie_break(tie_break.into());
        }
        config
    }

    fn run(&self, config: NestingConfig) -> anyhow::Result<()> {
        let config = self.apply(config);
        let report = solve(config, self.solver)?;

        match self.format {
            FormatArg::Text => print!("{}", report::render_text(&report)),
            FormatArg::Json => println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialize report")?
            ),
        }
        Ok(())
    }
}

fn solve(config: NestingConfig, solver: SolverArg) -> u_cutlist_d1::Result<NestingReport> {
    match solver {
        SolverArg::BranchBound => Nester1D::new(config).solve(),
        SolverArg::GoodLp => {
            if !is_milp_available() {
                return Err(Error::ConfigError(
                    "solver 'good-lp' requires building with the 'milp' feature".to_string(),
                ));
            }
            Nester1D::new(config).with_solver(GoodLpSolver::new()).solve()
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file, options } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let config: NestingConfig = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            log::debug!(
                "loaded {}: {} parts, {} offcuts, {} new stock",
                file.display(),
                config.parts.len(),
                config.existing_offcuts.len(),
                config.new_stock.len()
            );
            options.run(config)?;
        }

        Commands::Sample => {
            println!("{}", serde_json::to_string_pretty(&NestingConfig::sample())?);
        }

        Commands::Demo { options } => {
            options.run(NestingConfig::sample())?;
        }
    }

    Ok(())
}
