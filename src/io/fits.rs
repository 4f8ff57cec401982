//! Read/write boundary-fit JSON files.
//!
//! The fit JSON is the portable record of the austenite boundary regressions:
//! - the literature points that were fitted
//! - quadratic coefficients and fit diagnostics
//! - a precomputed fitted grid for quick plotting

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::QuadraticFit;
use crate::error::AppError;
use crate::math::sample_quadratic;

/// Points evaluated along each fitted boundary.
const GRID_POINTS: usize = 101;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitGrid {
    pub carbon_wt: Vec<f64>,
    pub temperature_k: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFit {
    pub name: String,
    /// Phase field boundary the data trace, e.g. `α+γ / γ`.
    pub boundary: String,
    pub carbon_wt: Vec<f64>,
    pub temperature_k: Vec<f64>,
    pub fit: QuadraticFit,
    pub grid: FitGrid,
}

impl BoundaryFit {
    pub fn new(
        name: &str,
        boundary: &str,
        carbon_wt: &[f64],
        temperature_k: &[f64],
        fit: QuadraticFit,
    ) -> Self {
        let lo = carbon_wt.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = carbon_wt.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (xs, ys): (Vec<f64>, Vec<f64>) =
            sample_quadratic(&fit, lo, hi, GRID_POINTS).into_iter().unzip();

        BoundaryFit {
            name: name.to_string(),
            boundary: boundary.to_string(),
            carbon_wt: carbon_wt.to_vec(),
            temperature_k: temperature_k.to_vec(),
            fit,
            grid: FitGrid {
                carbon_wt: xs,
                temperature_k: ys,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub fits: Vec<BoundaryFit>,
}

impl FitFile {
    pub fn new(fits: Vec<BoundaryFit>) -> Self {
        FitFile {
            tool: env!("CARGO_PKG_NAME").to_string(),
            generated_at: Utc::now(),
            model: "T = a*C^2 + b*C + c".to_string(),
            fits,
        }
    }
}

/// Write a fit JSON file.
pub fn write_fit_json(path: &Path, file: &FitFile) -> Result<(), AppError> {
    let out = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create fit JSON '{}': {e}", path.display()))
    })?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write fit JSON: {e}")))?;
    println!("Saved: {}", path.display());
    Ok(())
}

/// Read a fit JSON file.
pub fn read_fit_json(path: &Path) -> Result<FitFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open fit JSON '{}': {e}", path.display()))
    })?;
    let fits: FitFile = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid fit JSON: {e}")))?;
    Ok(fits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::quadratic_fit;

    #[test]
    fn grid_spans_the_data_range() {
        let c = [0.80, 1.00, 1.20, 1.40, 1.60, 1.80];
        let t = [995.0, 985.0, 970.0, 950.0, 925.0, 900.0];
        let fit = quadratic_fit(&c, &t).unwrap();
        let b = BoundaryFit::new("high", "γ / γ+Fe₃C", &c, &t, fit);

        assert_eq!(b.grid.carbon_wt.len(), GRID_POINTS);
        assert_eq!(b.grid.carbon_wt[0], 0.80);
        assert!((b.grid.carbon_wt[GRID_POINTS - 1] - 1.80).abs() < 1e-12);
        assert!((b.grid.temperature_k[0] - fit.eval(0.80)).abs() < 1e-12);
    }

    #[test]
    fn json_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fits.json");
        let fit = quadratic_fit(&[0.0, 1.0, 2.0], &[1.0, 2.0, 5.0]).unwrap();
        let boundary = BoundaryFit::new("x", "y", &[0.0, 1.0, 2.0], &[1.0, 2.0, 5.0], fit);
        let file = FitFile::new(vec![boundary]);

        write_fit_json(&path, &file).unwrap();
        let back = read_fit_json(&path).unwrap();
        assert_eq!(back.fits.len(), 1);
        assert_eq!(back.fits[0].name, "x");
        assert!((back.fits[0].fit.a - 1.0).abs() < 1e-9);
        assert_eq!(back.generated_at, file.generated_at);
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_fit_json(&path).unwrap_err().exit_code(), 2);
    }
}
