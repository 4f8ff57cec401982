//! Command-line parsing for the Fe-C / Fe-Cr-C steel design report.
//!
//! Argument parsing and command dispatch stay apart from the analyses.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::FigureFormat;

pub mod menu;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "fephase",
    version,
    about = "Steel design report from Fe-C and Fe-Cr-C phase equilibria"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Choose an analysis from a numbered menu (default when no subcommand is given).
    Menu(RunArgs),
    /// Part A: carbon steel design on the Fe-C binary (A1-A9).
    PartA(RunArgs),
    /// Part B: Type 410 stainless steel in the Fe-Cr-C system (B1-B2).
    PartB(RunArgs),
    /// Run Part A then Part B.
    All(RunArgs),
    /// Verify databases, the equilibrium engine, the output directory and the plot font.
    Check(RunArgs),
}

impl Command {
    pub fn args(&self) -> &RunArgs {
        match self {
            Command::Menu(a)
            | Command::PartA(a)
            | Command::PartB(a)
            | Command::All(a)
            | Command::Check(a) => a,
        }
    }
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Directory for figures, tables and summaries.
    #[arg(long, env = "FEPHASE_OUTPUT_DIR", default_value = "outputs")]
    pub output_dir: PathBuf,

    /// Directory holding (or receiving) the `.tdb` databases.
    #[arg(long, env = "FEPHASE_DB_DIR", default_value = ".")]
    pub db_dir: PathBuf,

    /// Figure file format.
    #[arg(long, value_enum, default_value_t = FigureFormat::Png)]
    pub format: FigureFormat,

    /// TrueType font used for figure text.
    #[arg(long, env = "FEPHASE_FONT", value_name = "TTF")]
    pub font: Option<PathBuf>,

    /// Phase-map temperature steps (500-2000 K).
    #[arg(long, default_value_t = 120)]
    pub grid_t: usize,

    /// Phase-map composition steps (0-7 wt% C).
    #[arg(long, default_value_t = 140)]
    pub grid_c: usize,

    /// Site-fraction steps per sublattice when sampling Gibbs energies.
    #[arg(long, default_value_t = 60)]
    pub sample_steps: usize,

    /// Skip figures; tables and text summaries are still written.
    #[arg(long)]
    pub no_figures: bool,

    /// Debug logging on stderr (`RUST_LOG` overrides).
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_reach_every_subcommand() {
        let cli = Cli::try_parse_from([
            "fephase",
            "part-b",
            "--grid-t",
            "10",
            "--no-figures",
            "--format",
            "svg",
        ])
        .unwrap();
        let Command::PartB(args) = &cli.command else {
            panic!("expected part-b");
        };
        assert_eq!(args.grid_t, 10);
        assert!(args.no_figures);
        assert_eq!(args.format, FigureFormat::Svg);
        assert_eq!(cli.command.args().sample_steps, 60);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["fephase", "all", "--format", "gif"]).is_err());
    }
}
