use crate::PfError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, PfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(PfError::NonFinite { what, value: v })
    }
}

/// Logarithmically spaced samples from `lo` to `hi` inclusive.
///
/// Both bounds must be strictly positive with `lo < hi`.
pub fn logspace(lo: Real, hi: Real, n: usize) -> Result<Vec<Real>, PfError> {
    if !(lo > 0.0 && hi > lo) {
        return Err(PfError::InvalidArg {
            what: "logspace bounds must satisfy 0 < lo < hi",
        });
    }
    if n < 2 {
        return Err(PfError::InvalidArg {
            what: "logspace needs at least two samples",
        });
    }
    let (l0, l1) = (lo.ln(), hi.ln());
    let step = (l1 - l0) / (n - 1) as Real;
    Ok((0..n).map(|i| (l0 + step * i as Real).exp()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn logspace_endpoints_and_monotonicity() {
        let mesh = logspace(1e-3, 10.0, 16).unwrap();
        assert_eq!(mesh.len(), 16);
        assert!((mesh[0] - 1e-3).abs() < 1e-12);
        assert!((mesh[15] - 10.0).abs() < 1e-9);
        assert!(mesh.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn logspace_rejects_bad_bounds() {
        assert!(logspace(0.0, 1.0, 8).is_err());
        assert!(logspace(2.0, 1.0, 8).is_err());
        assert!(logspace(1.0, 2.0, 1).is_err());
    }
}
