//! Numerical quadrature over sample meshes.

use crate::error::{SolverError, SolverResult};

/// Trapezoidal integration of samples `y` over mesh `x`.
///
/// The mesh need not be uniform; the radial profile integrals use
/// log-spaced meshes that concentrate samples near the centerline.
pub fn trapz(x: &[f64], y: &[f64]) -> SolverResult<f64> {
    if x.len() != y.len() {
        return Err(SolverError::ProblemSetup {
            what: format!("trapz mesh/sample length mismatch: {} vs {}", x.len(), y.len()),
        });
    }
    if x.len() < 2 {
        return Err(SolverError::ProblemSetup {
            what: "trapz needs at least two samples".to_string(),
        });
    }

    let mut acc = 0.0;
    for i in 1..x.len() {
        acc += 0.5 * (y[i] + y[i - 1]) * (x[i] - x[i - 1]);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::numeric::logspace;

    #[test]
    fn integrates_linear_exactly() {
        let x: Vec<f64> = (0..=10).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        let area = trapz(&x, &y).unwrap();
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gaussian_moment_on_log_mesh() {
        // ∫ 2r exp(-r²) dr over (0, ∞) = 1; a log mesh out to 6 captures it.
        let mut x = vec![0.0];
        x.extend(logspace(1e-4, 6.0, 300).unwrap());
        let y: Vec<f64> = x.iter().map(|r| 2.0 * r * (-r * r).exp()).collect();
        let area = trapz(&x, &y).unwrap();
        assert!((area - 1.0).abs() < 1e-4, "area = {area}");
    }

    #[test]
    fn mismatched_lengths_rejected() {
        assert!(trapz(&[0.0, 1.0], &[1.0]).is_err());
        assert!(trapz(&[0.0], &[1.0]).is_err());
    }
}
