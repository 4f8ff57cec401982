//! Shared run logic used by the subcommands and the interactive menu.
//!
//! Keeping this in one place means `part-a`, `part-b`, `all` and menu choices
//! run exactly the same workflow.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::analysis::{AnalysisContext, part_a, part_b};
use crate::domain::RunConfig;
use crate::error::AppError;
use crate::io::ensure_dir;
use crate::plot::fonts;
use crate::report::print_section_header;
use crate::thermo::{Conditions, Database, FE_C_TDB, FE_CR_C_TDB, equilibrium};

pub fn run_part_a(config: &RunConfig) -> Result<part_a::PartAResults, AppError> {
    let ctx = AnalysisContext::new(config.clone())?;
    part_a::run(&ctx)
}

pub fn run_part_b(config: &RunConfig) -> Result<part_b::PartBResults, AppError> {
    let ctx = AnalysisContext::new(config.clone())?;
    part_b::run(&ctx)
}

pub fn run_all(config: &RunConfig) -> Result<(), AppError> {
    let ctx = AnalysisContext::new(config.clone())?;
    print_section_header("Running Complete Project");
    part_a::run(&ctx)?;
    part_b::run(&ctx)?;

    print_section_header("PROJECT COMPLETE");
    println!("All calculations finished successfully!");
    println!("\nResults Location:");
    println!("  - Figures and tables: {}", config.output_dir.display());
    println!("  - Databases: {}", config.db_dir.display());
    Ok(())
}

/// Outcome of `fephase check`.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub fe_c_phases: usize,
    pub fe_cr_c_phases: usize,
    /// Stable phases at X(C) = 0.02 and 1000 K.
    pub engine_label: String,
    pub font: Option<PathBuf>,
}

/// Verify databases, one equilibrium, the output directory and font discovery.
pub fn check(config: &RunConfig) -> Result<CheckReport, AppError> {
    print_section_header("SETUP VERIFICATION");

    let fe_c = Database::parse(FE_C_TDB)?;
    println!("✓ Fe-C database parses: {:?}", fe_c.phase_names());
    let fe_cr_c = Database::parse(FE_CR_C_TDB)?;
    println!("✓ Fe-Cr-C database parses: {:?}", fe_cr_c.phase_names());

    let sample = equilibrium(
        &fe_c,
        &["FE", "C", "VA"],
        &["LIQUID", "BCC_A2", "FCC_A1", "CEMENTITE"],
        &Conditions::new(1000.0).with_x("C", 0.02),
    )?;
    let engine_label = sample.label();
    println!("✓ Equilibrium engine: X(C) = 0.02 at 1000 K -> {engine_label}");

    ensure_dir(&config.output_dir)?;
    let marker = config.output_dir.join(".fephase_check");
    std::fs::write(&marker, "ok\n")
        .and_then(|()| std::fs::remove_file(&marker))
        .map_err(|e| {
            let dir = config.output_dir.display();
            AppError::new(2, format!("Output directory '{dir}' is not writable: {e}"))
        })?;
    println!("✓ Output directory writable: {}", config.output_dir.display());

    let font = fonts::find_font(config.font_path.as_deref());
    match &font {
        Some(path) => println!("✓ Plot font: {}", path.display()),
        None => {
            warn!("no TrueType font found");
            println!("✗ No plot font found; pass --font <file.ttf> or use --no-figures");
        }
    }

    info!(engine = %engine_label, "setup check finished");
    Ok(CheckReport {
        fe_c_phases: fe_c.phase_names().len(),
        fe_cr_c_phases: fe_cr_c.phase_names().len(),
        engine_label,
        font,
    })
}
