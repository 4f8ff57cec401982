//! Quadratic least-squares regression and grid helpers.

use nalgebra::{DMatrix, DVector};

use crate::domain::QuadraticFit;
use crate::error::AppError;
use crate::math::solve_least_squares;

/// Fit `y = a x² + b x + c` to the given points.
pub fn quadratic_fit(xs: &[f64], ys: &[f64]) -> Result<QuadraticFit, AppError> {
    if xs.len() != ys.len() {
        return Err(AppError::new(
            3,
            format!(
                "Quadratic fit needs matching x/y lengths (got {} and {}).",
                xs.len(),
                ys.len()
            ),
        ));
    }
    let n = xs.len();
    if n < 3 {
        return Err(AppError::new(
            3,
            format!("Quadratic fit needs at least 3 points (got {n})."),
        ));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(AppError::new(3, "Quadratic fit input contains non-finite values."));
    }

    let mut design = DMatrix::zeros(n, 3);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = x * x;
        design[(i, 1)] = x;
        design[(i, 2)] = 1.0;
    }
    let y = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &y)
        .ok_or_else(|| AppError::new(4, "Quadratic fit is singular (need 3 distinct x values)."))?;

    let mut fit = QuadraticFit {
        a: beta[0],
        b: beta[1],
        c: beta[2],
        sse: 0.0,
        rmse: 0.0,
        n,
    };
    fit.sse = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let r = y - fit.eval(x);
            r * r
        })
        .sum();
    fit.rmse = (fit.sse / n as f64).sqrt();

    Ok(fit)
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n as f64 - 1.0);
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Sample a fitted quadratic over `[x0, x1]`.
pub fn sample_quadratic(fit: &QuadraticFit, x0: f64, x1: f64, n: usize) -> Vec<(f64, f64)> {
    linspace(x0, x1, n).into_iter().map(|x| (x, fit.eval(x))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_pure_square() {
        let xs = [-2.0, -1.0, 0.0, 1.0, 2.0, 3.0];
        let ys: Vec<f64> = xs.iter().map(|x| x * x).collect();
        let fit = quadratic_fit(&xs, &ys).unwrap();

        assert!((fit.a - 1.0).abs() < 1e-9, "a={}", fit.a);
        assert!(fit.b.abs() < 1e-9, "b={}", fit.b);
        assert!(fit.c.abs() < 1e-9, "c={}", fit.c);
        assert!(fit.sse < 1e-12);
    }

    #[test]
    fn low_carbon_boundary_is_nearly_linear() {
        let c = [0.02, 0.10, 0.20, 0.30, 0.40, 0.50];
        let t = [1000.0, 980.0, 960.0, 940.0, 920.0, 900.0];
        let fit = quadratic_fit(&c, &t).unwrap();

        // The data are not exactly linear at the first point, but the slope is ~-200 K/wt%.
        assert!(fit.b < -150.0 && fit.b > -260.0, "b={}", fit.b);
        assert!(fit.rmse < 2.0, "rmse={}", fit.rmse);
    }

    #[test]
    fn rejects_short_or_mismatched_input() {
        assert_eq!(quadratic_fit(&[1.0, 2.0], &[1.0, 2.0]).unwrap_err().exit_code(), 3);
        assert_eq!(quadratic_fit(&[1.0, 2.0, 3.0], &[1.0, 2.0]).unwrap_err().exit_code(), 3);
    }

    #[test]
    fn linspace_includes_both_ends() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], 0.0);
        assert!((v[4] - 1.0).abs() < 1e-15);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
