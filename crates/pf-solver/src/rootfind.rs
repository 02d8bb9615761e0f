//! Scalar root finding: safeguarded bracketed solve and damped Newton.

use crate::error::{SolverError, SolverResult};
use tracing::debug;

/// Root solver configuration.
#[derive(Clone, Copy, Debug)]
pub struct RootConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance on |f|
    pub abs_tol: f64,
    /// Relative tolerance on the bracket width
    pub rel_tol: f64,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-8,
            rel_tol: 1e-10,
        }
    }
}

/// Root solve result.
#[derive(Clone, Copy, Debug)]
pub struct RootResult {
    /// Root estimate
    pub x: f64,
    /// Residual at the root estimate
    pub f: f64,
    /// Number of iterations
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Bracketed root solve: bisection safeguarded with secant steps.
///
/// Requires a sign change on [a, b]; returns `BracketFailed` otherwise so the
/// caller can choose a fallback evaluation instead of crashing.
pub fn find_root_bracketed<F>(
    mut f: F,
    a: f64,
    b: f64,
    what: &'static str,
    config: &RootConfig,
) -> SolverResult<RootResult>
where
    F: FnMut(f64) -> SolverResult<f64>,
{
    if !(a.is_finite() && b.is_finite()) || a == b {
        return Err(SolverError::ProblemSetup {
            what: format!("invalid bracket [{a}, {b}] for {what}"),
        });
    }

    let (mut lo, mut hi) = if a < b { (a, b) } else { (b, a) };
    let mut f_lo = f(lo)?;
    let mut f_hi = f(hi)?;

    if f_lo == 0.0 {
        return Ok(RootResult {
            x: lo,
            f: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if f_hi == 0.0 {
        return Ok(RootResult {
            x: hi,
            f: 0.0,
            iterations: 0,
            converged: true,
        });
    }
    if f_lo * f_hi > 0.0 {
        return Err(SolverError::BracketFailed { what });
    }

    let mut x = 0.5 * (lo + hi);
    let mut fx = f(x)?;

    for iter in 0..config.max_iterations {
        if fx.abs() < config.abs_tol || (hi - lo) < config.rel_tol * hi.abs().max(1.0) {
            return Ok(RootResult {
                x,
                f: fx,
                iterations: iter,
                converged: true,
            });
        }

        // Shrink the bracket around the sign change.
        if f_lo * fx < 0.0 {
            hi = x;
            f_hi = fx;
        } else {
            lo = x;
            f_lo = fx;
        }

        // Secant candidate from the bracket endpoints; fall back to the
        // midpoint when it degenerates or escapes the bracket.
        let secant = lo - f_lo * (hi - lo) / (f_hi - f_lo);
        x = if secant.is_finite() && secant > lo && secant < hi {
            secant
        } else {
            0.5 * (lo + hi)
        };
        fx = f(x)?;
    }

    debug!(what, residual = fx, "bracketed root solve hit iteration limit");
    Err(SolverError::ConvergenceFailed {
        what: format!("bracketed solve for {what}: residual {fx:.3e} after max iterations"),
    })
}

/// Damped scalar Newton iteration with an optional lower bound on x.
///
/// `f_df` returns (residual, derivative). Steps that would cross `min_x`
/// are halved, mirroring the positivity safeguarding of the network Newton
/// solver this was derived from.
pub fn newton_scalar<F>(
    mut f_df: F,
    x0: f64,
    min_x: Option<f64>,
    what: &'static str,
    config: &RootConfig,
) -> SolverResult<RootResult>
where
    F: FnMut(f64) -> SolverResult<(f64, f64)>,
{
    let mut x = x0;

    for iter in 0..config.max_iterations {
        let (fx, dfx) = f_df(x)?;
        if !fx.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("non-finite residual in Newton solve for {what}"),
            });
        }
        if fx.abs() < config.abs_tol {
            return Ok(RootResult {
                x,
                f: fx,
                iterations: iter,
                converged: true,
            });
        }
        if dfx == 0.0 || !dfx.is_finite() {
            return Err(SolverError::Numeric {
                what: format!("degenerate derivative in Newton solve for {what}"),
            });
        }

        let mut step = -fx / dfx;
        if let Some(floor) = min_x {
            let mut guard = 0;
            while x + step <= floor && guard < 60 {
                step *= 0.5;
                guard += 1;
            }
            if x + step <= floor {
                return Err(SolverError::ConvergenceFailed {
                    what: format!("Newton solve for {what} pinned at lower bound"),
                });
            }
        }

        let x_new = x + step;
        if (x_new - x).abs() < config.rel_tol * x.abs().max(1.0) {
            let (f_new, _) = f_df(x_new)?;
            return Ok(RootResult {
                x: x_new,
                f: f_new,
                iterations: iter + 1,
                converged: f_new.abs() < config.abs_tol.max(1e-6),
            });
        }
        x = x_new;
    }

    Err(SolverError::ConvergenceFailed {
        what: format!("Newton solve for {what}: max iterations reached"),
    })
}
