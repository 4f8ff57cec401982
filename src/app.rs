//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - dispatches to the menu, one part, both parts or the setup check

use clap::Parser;
use tracing::debug;

use crate::cli::menu::{self, MenuChoice};
use crate::cli::{Command, RunArgs};
use crate::domain::RunConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `fephase` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // `fephase` and `fephase --font x.ttf` behave like `fephase menu ...`.
    //
    // Clap requires a subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    crate::logging::init(cli.command.args().verbose);
    let config = run_config_from_args(cli.command.args())?;
    debug!(?config, "run configuration");

    match cli.command {
        Command::Menu(_) => handle_menu(&config),
        Command::PartA(_) => pipeline::run_part_a(&config).map(|_| ()),
        Command::PartB(_) => pipeline::run_part_b(&config).map(|_| ()),
        Command::All(_) => pipeline::run_all(&config),
        Command::Check(_) => pipeline::check(&config).map(|_| ()),
    }
}

fn handle_menu(config: &RunConfig) -> Result<(), AppError> {
    print!(
        "{}",
        crate::report::format_section_header("STEEL DESIGN FROM Fe-C AND Fe-Cr-C PHASE EQUILIBRIA")
    );
    let stdin = std::io::stdin();
    match menu::prompt(stdin.lock(), std::io::stdout())? {
        MenuChoice::PartA => pipeline::run_part_a(config).map(|_| ()),
        MenuChoice::PartB => pipeline::run_part_b(config).map(|_| ()),
        MenuChoice::Both => pipeline::run_all(config),
        MenuChoice::Exit => {
            println!("Exiting...");
            Ok(())
        }
    }
}

pub fn run_config_from_args(args: &RunArgs) -> Result<RunConfig, AppError> {
    for (name, value) in [
        ("--grid-t", args.grid_t),
        ("--grid-c", args.grid_c),
        ("--sample-steps", args.sample_steps),
    ] {
        if value < 2 {
            return Err(AppError::new(2, format!("{name} must be at least 2 (got {value}).")));
        }
    }

    Ok(RunConfig {
        output_dir: args.output_dir.clone(),
        db_dir: args.db_dir.clone(),
        format: args.format,
        font_path: args.font.clone(),
        grid_t: args.grid_t,
        grid_c: args.grid_c,
        sample_steps: args.sample_steps,
        figures: !args.no_figures,
    })
}

/// Rewrite argv so `fephase` defaults to `fephase menu`.
///
/// Rules:
/// - `fephase`                      -> `fephase menu`
/// - `fephase --no-figures ...`     -> `fephase menu --no-figures ...`
/// - `fephase --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("menu".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "menu".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_menu() {
        assert_eq!(rewrite_args(argv(&["fephase"])), argv(&["fephase", "menu"]));
        assert_eq!(
            rewrite_args(argv(&["fephase", "--no-figures"])),
            argv(&["fephase", "menu", "--no-figures"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(rewrite_args(argv(&["fephase", "all"])), argv(&["fephase", "all"]));
        assert_eq!(rewrite_args(argv(&["fephase", "--help"])), argv(&["fephase", "--help"]));
    }

    #[test]
    fn config_mirrors_flags() {
        let cli = Cli::try_parse_from([
            "fephase",
            "check",
            "--grid-c",
            "7",
            "--no-figures",
            "--db-dir",
            "db",
        ])
        .unwrap();
        let config = run_config_from_args(cli.command.args()).unwrap();
        assert_eq!(config.grid_c, 7);
        assert!(!config.figures);
        assert_eq!(config.db_dir, std::path::PathBuf::from("db"));
    }

    #[test]
    fn tiny_grids_are_rejected() {
        let cli = Cli::try_parse_from(["fephase", "part-a", "--grid-t", "1"]).unwrap();
        let err = run_config_from_args(cli.command.args()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("--grid-t"));
    }
}
