//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - passed between the math helpers and the analyses
//! - exported to CSV/JSON
//! - printed in the terminal report

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::constants::{M_C, M_CR, M_FE};

/// Alloying elements handled by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Fe,
    Cr,
    C,
}

impl Element {
    pub const ALL: [Element; 3] = [Element::Fe, Element::Cr, Element::C];

    /// Element name as it appears in TDB files.
    pub fn symbol(self) -> &'static str {
        match self {
            Element::Fe => "FE",
            Element::Cr => "CR",
            Element::C => "C",
        }
    }

    /// Human-readable symbol.
    pub fn display_name(self) -> &'static str {
        match self {
            Element::Fe => "Fe",
            Element::Cr => "Cr",
            Element::C => "C",
        }
    }

    /// Molar mass in g/mol.
    pub fn molar_mass(self) -> f64 {
        match self {
            Element::Fe => M_FE,
            Element::Cr => M_CR,
            Element::C => M_C,
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.symbol().eq_ignore_ascii_case(symbol.trim()))
    }
}

/// Per-element fractions (weight or mole, depending on context), summing to 1.
pub type Fractions = BTreeMap<Element, f64>;

/// Output image format for figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FigureFormat {
    Png,
    Svg,
}

impl FigureFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FigureFormat::Png => "png",
            FigureFormat::Svg => "svg",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory receiving figures, CSV tables and text summaries.
    pub output_dir: PathBuf,
    /// Directory holding the `.tdb` database files.
    pub db_dir: PathBuf,
    pub format: FigureFormat,
    /// Explicit TrueType font for figure text.
    pub font_path: Option<PathBuf>,
    /// Phase-map resolution along the temperature axis.
    pub grid_t: usize,
    /// Phase-map resolution along the composition axis.
    pub grid_c: usize,
    /// Site-fraction grid steps used when sampling Gibbs energies.
    pub sample_steps: usize,
    /// Render figures; tables and text are always written.
    pub figures: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            db_dir: PathBuf::from("."),
            format: FigureFormat::Png,
            font_path: None,
            grid_t: 120,
            grid_c: 140,
            sample_steps: 60,
            figures: true,
        }
    }
}

/// An invariant reaction point read off the Fe-C diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalPoint {
    #[serde(rename = "Critical_Point")]
    pub name: String,
    #[serde(rename = "Temperature_K")]
    pub temperature_k: f64,
    #[serde(rename = "Temperature_C")]
    pub temperature_c: f64,
    #[serde(rename = "Composition_wt%C")]
    pub composition_wt: f64,
    #[serde(rename = "Reaction")]
    pub reaction: String,
}

/// Quadratic `y = a x² + b x + c` with fit diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticFit {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub sse: f64,
    pub rmse: f64,
    pub n: usize,
}

impl QuadraticFit {
    pub fn eval(&self, x: f64) -> f64 {
        (self.a * x + self.b) * x + self.c
    }
}

/// Two phase fractions labelled for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSplit {
    pub left_name: String,
    pub right_name: String,
    pub left: f64,
    pub right: f64,
}

impl PhaseSplit {
    pub fn total(&self) -> f64 {
        self.left + self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_lookup_is_case_insensitive() {
        assert_eq!(Element::from_symbol("cr"), Some(Element::Cr));
        assert_eq!(Element::from_symbol(" FE "), Some(Element::Fe));
        assert_eq!(Element::from_symbol("VA"), None);
    }

    #[test]
    fn quadratic_eval_uses_horner_form() {
        let fit = QuadraticFit { a: 2.0, b: -3.0, c: 1.0, sse: 0.0, rmse: 0.0, n: 3 };
        assert!((fit.eval(2.0) - 3.0).abs() < 1e-12);
    }
}
