//! The report's analyses.
//!
//! - Part A: binary Fe-C carbon steel (`part_a`)
//! - Part B: Fe-Cr-C martensitic stainless steel (`part_b`)
//!
//! Each analysis has a pure `compute`-style function returning plain values and
//! a `run_*` function that prints, writes tables and saves the figure.

pub mod part_a;
pub mod part_b;

use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{Element, Fractions, RunConfig};
use crate::error::AppError;
use crate::io::ensure_dir;
use crate::plot::{Figure, fonts, save_figure};
use crate::report::print_section_header;
use crate::thermo::{Database, load_or_create};

/// Shared state of a run: configuration plus a ready output directory.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub config: RunConfig,
}

impl AnalysisContext {
    /// Create the output directory and register the plot font when figures are on.
    pub fn new(config: RunConfig) -> Result<Self, AppError> {
        ensure_dir(&config.output_dir)?;
        if config.figures {
            let font = fonts::ensure_registered(config.font_path.as_deref())?;
            debug!(font = %font.display(), "plot font registered");
        }
        Ok(AnalysisContext { config })
    }

    pub fn output_path(&self, file: &str) -> PathBuf {
        self.config.output_dir.join(file)
    }

    /// Save a figure, or skip it when figures are disabled.
    pub fn save(&self, figure: &Figure, stem: &str) -> Result<Option<PathBuf>, AppError> {
        if !self.config.figures {
            debug!(stem, "figures disabled, skipping");
            return Ok(None);
        }
        save_figure(figure, &self.config.output_dir, stem, self.config.format).map(Some)
    }

    /// Load `file` from the database directory, writing `contents` first if absent.
    pub fn load_database(
        &self,
        title: &str,
        file: &str,
        contents: &str,
    ) -> Result<Database, AppError> {
        print_section_header(title);
        let path = self.config.db_dir.join(file);
        let existed = path.exists();
        let db = load_or_create(&path, contents)?;

        if existed {
            println!("Loading database from {}", path.display());
        } else {
            println!("Created simplified database {}", path.display());
        }
        println!("Database loaded successfully");
        println!("Elements: {:?}", db.element_names());
        println!("Phases: {:?}", db.phase_names());
        info!(path = %path.display(), phases = db.phase_names().len(), "database ready");
        Ok(db)
    }
}

/// Mole-fraction vector in `components` order from weight fractions.
pub fn mole_vector(components: &[String], wt: &Fractions) -> Result<Vec<f64>, AppError> {
    let x = crate::math::wt_to_mole_fraction(wt)?;
    components
        .iter()
        .map(|c| {
            let el = Element::from_symbol(c)
                .ok_or_else(|| AppError::new(3, format!("No molar mass for component {c}.")))?;
            Ok(x.get(&el).copied().unwrap_or(0.0))
        })
        .collect()
}

/// Keep the requested phases the database actually defines, in request order.
pub fn available_phases<'p>(db: &Database, wanted: &[&'p str]) -> Vec<&'p str> {
    wanted.iter().copied().filter(|p| db.has_phase(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::alloy_wt_fractions;
    use crate::thermo::FE_C_TDB;

    #[test]
    fn mole_vector_follows_component_order() {
        let wt = alloy_wt_fractions(12.5, 0.15).unwrap();
        let comps = vec!["C".to_string(), "CR".to_string(), "FE".to_string()];
        let x = mole_vector(&comps, &wt).unwrap();

        assert_eq!(x.len(), 3);
        assert!((x.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(x[0] < x[1] && x[1] < x[2]);
    }

    #[test]
    fn missing_components_get_zero() {
        let wt = alloy_wt_fractions(0.0, 0.76).unwrap();
        let comps = vec!["FE".to_string(), "CR".to_string(), "C".to_string()];
        assert_eq!(mole_vector(&comps, &wt).unwrap()[1], 0.0);
        assert!(mole_vector(&["VA".to_string()], &wt).is_err());
    }

    #[test]
    fn unknown_phases_are_filtered() {
        let db = Database::parse(FE_C_TDB).unwrap();
        let phases = available_phases(&db, &["LIQUID", "M23C6", "GRAPHITE"]);
        assert_eq!(phases, vec!["LIQUID", "GRAPHITE"]);
    }

    #[test]
    fn context_without_figures_needs_no_font() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfig {
            output_dir: dir.path().join("out"),
            figures: false,
            ..RunConfig::default()
        };
        let ctx = AnalysisContext::new(config).unwrap();
        assert!(ctx.config.output_dir.is_dir());
        assert!(ctx.output_path("a.csv").ends_with("out/a.csv"));
    }
}
