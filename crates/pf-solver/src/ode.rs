//! Adaptive explicit integration with dense per-step output.
//!
//! The integrator is a Cash–Karp Runge–Kutta 4(5) pair with step-size
//! control. It is exposed two ways:
//!
//! - [`AdaptiveRk45`]: a lazy sequence of accepted `(s, state)` pairs.
//!   Every internal step is retrievable; the caller decides how much of the
//!   sequence to materialize and when to stop.
//! - [`integrate_adaptive`]: a convenience driver that materializes the
//!   sequence into an [`OdeSolution`] under a caller-supplied termination
//!   predicate and step budget.
//!
//! Failure policy: a non-finite derivative, a right-hand-side error, or a
//! step collapse below `h_min` ends the sequence with a `Stalled` status.
//! The trajectory accumulated so far stays available; nothing panics.

use crate::error::{SolverError, SolverResult};
use nalgebra::DVector;
use tracing::{debug, warn};

/// Options for adaptive integration.
#[derive(Clone, Debug)]
pub struct OdeOptions {
    /// Relative tolerance for step-error control
    pub rtol: f64,
    /// Absolute tolerance for step-error control
    pub atol: f64,
    /// Initial step size
    pub h_initial: f64,
    /// Smallest allowed step before the integration is declared stalled
    pub h_min: f64,
    /// Largest allowed step
    pub h_max: f64,
    /// Maximum number of accepted steps (safety budget)
    pub max_steps: usize,
}

impl Default for OdeOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            h_initial: 1e-4,
            h_min: 1e-12,
            h_max: 1.0,
            max_steps: 10_000,
        }
    }
}

impl OdeOptions {
    fn validate(&self) -> SolverResult<()> {
        if !(self.h_initial > 0.0 && self.h_min > 0.0 && self.h_max >= self.h_initial) {
            return Err(SolverError::ProblemSetup {
                what: "step sizes must satisfy 0 < h_min, 0 < h_initial <= h_max".to_string(),
            });
        }
        if !(self.rtol > 0.0 && self.atol > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: "tolerances must be positive".to_string(),
            });
        }
        if self.max_steps == 0 {
            return Err(SolverError::ProblemSetup {
                what: "max_steps must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// How an integration run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OdeStatus {
    /// Reached the end of the integration interval.
    ReachedEnd,
    /// Caller's termination predicate fired.
    Terminated,
    /// Accepted-step budget exhausted.
    StepBudget,
    /// Derivative evaluation failed or the step collapsed; trajectory is
    /// incomplete.
    Stalled,
}

/// Materialized trajectory with completion status.
#[derive(Clone, Debug)]
pub struct OdeSolution {
    /// Independent variable at every accepted step (dense output).
    pub s: Vec<f64>,
    /// State at every accepted step.
    pub y: Vec<DVector<f64>>,
    pub status: OdeStatus,
    pub steps_taken: usize,
}

impl OdeSolution {
    /// True unless the integration stalled on a numerical failure.
    pub fn is_complete(&self) -> bool {
        self.status != OdeStatus::Stalled
    }
}

// Cash–Karp tableau.
const B21: f64 = 1.0 / 5.0;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 3.0 / 10.0;
const B42: f64 = -9.0 / 10.0;
const B43: f64 = 6.0 / 5.0;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 5.0 / 2.0;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110592.0;
const B65: f64 = 253.0 / 4096.0;
const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;
const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 1.0 / 4.0;

/// Lazy adaptive Runge–Kutta sequence.
///
/// Yields `(s, y)` after each accepted step. After the sequence ends,
/// [`AdaptiveRk45::status`] reports why.
pub struct AdaptiveRk45<F> {
    rhs: F,
    opts: OdeOptions,
    s: f64,
    s_end: f64,
    y: DVector<f64>,
    h: f64,
    steps: usize,
    finished: Option<OdeStatus>,
}

impl<F> AdaptiveRk45<F>
where
    F: FnMut(f64, &DVector<f64>) -> SolverResult<DVector<f64>>,
{
    pub fn new(
        rhs: F,
        s0: f64,
        s_end: f64,
        y0: DVector<f64>,
        opts: OdeOptions,
    ) -> SolverResult<Self> {
        opts.validate()?;
        if !(s_end > s0) {
            return Err(SolverError::ProblemSetup {
                what: format!("integration interval [{s0}, {s_end}] is empty"),
            });
        }
        let h = opts.h_initial.min(s_end - s0);
        Ok(Self {
            rhs,
            opts,
            s: s0,
            s_end,
            y: y0,
            h,
            steps: 0,
            finished: None,
        })
    }

    /// Why the sequence ended (None while still running).
    pub fn status(&self) -> Option<OdeStatus> {
        self.finished
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// One Cash–Karp attempt at step size `h`; returns (y_new, error norm).
    fn attempt(&mut self, h: f64) -> SolverResult<(DVector<f64>, f64)> {
        let s = self.s;
        let y = &self.y;

        let k1 = (self.rhs)(s, y)?;
        let k2 = (self.rhs)(s + B21 * h, &(y + h * B21 * &k1))?;
        let k3 = (self.rhs)(s + 0.3 * h, &(y + h * (B31 * &k1 + B32 * &k2)))?;
        let k4 = (self.rhs)(s + 0.6 * h, &(y + h * (B41 * &k1 + B42 * &k2 + B43 * &k3)))?;
        let k5 = (self.rhs)(
            s + h,
            &(y + h * (B51 * &k1 + B52 * &k2 + B53 * &k3 + B54 * &k4)),
        )?;
        let k6 = (self.rhs)(
            s + 0.875 * h,
            &(y + h * (B61 * &k1 + B62 * &k2 + B63 * &k3 + B64 * &k4 + B65 * &k5)),
        )?;

        let y_new = y + h * (C1 * &k1 + C3 * &k3 + C4 * &k4 + C6 * &k6);
        let y_err = h * (DC1 * &k1 + DC3 * &k3 + DC4 * &k4 + DC5 * &k5 + DC6 * &k6);

        let mut err_norm = 0.0_f64;
        for i in 0..y.len() {
            let scale = self.opts.atol + self.opts.rtol * y[i].abs().max(y_new[i].abs());
            err_norm = err_norm.max((y_err[i] / scale).abs());
        }
        Ok((y_new, err_norm))
    }
}

impl<F> Iterator for AdaptiveRk45<F>
where
    F: FnMut(f64, &DVector<f64>) -> SolverResult<DVector<f64>>,
{
    type Item = (f64, DVector<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished.is_some() {
            return None;
        }
        if self.s >= self.s_end {
            self.finished = Some(OdeStatus::ReachedEnd);
            return None;
        }
        if self.steps >= self.opts.max_steps {
            self.finished = Some(OdeStatus::StepBudget);
            return None;
        }

        loop {
            let h = self.h.min(self.s_end - self.s);

            let (y_new, err_norm) = match self.attempt(h) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(error = %e, s = self.s, "derivative evaluation failed; trajectory incomplete");
                    self.finished = Some(OdeStatus::Stalled);
                    return None;
                }
            };

            if !err_norm.is_finite() || y_new.iter().any(|v| !v.is_finite()) {
                // Retry with a smaller step before giving up.
                self.h *= 0.25;
                if self.h < self.opts.h_min {
                    warn!(s = self.s, "non-finite step results; trajectory incomplete");
                    self.finished = Some(OdeStatus::Stalled);
                    return None;
                }
                continue;
            }

            if err_norm <= 1.0 {
                // Accept.
                self.s += h;
                self.y = y_new;
                self.steps += 1;

                // PI-free controller: h ~ err^(-1/5), clamped growth.
                let factor = if err_norm > 0.0 {
                    (0.9 * err_norm.powf(-0.2)).clamp(0.2, 5.0)
                } else {
                    5.0
                };
                self.h = (h * factor).min(self.opts.h_max);

                return Some((self.s, self.y.clone()));
            }

            // Reject and shrink.
            let factor = (0.9 * err_norm.powf(-0.25)).clamp(0.1, 0.9);
            self.h = h * factor;
            if self.h < self.opts.h_min {
                warn!(s = self.s, err_norm, "step size collapsed; trajectory incomplete");
                self.finished = Some(OdeStatus::Stalled);
                return None;
            }
        }
    }
}

/// Materialize the adaptive sequence under a termination predicate.
///
/// The predicate sees each accepted `(s, y)` and returns true to stop.
pub fn integrate_adaptive<F, T>(
    rhs: F,
    s0: f64,
    s_end: f64,
    y0: DVector<f64>,
    mut should_stop: T,
    opts: &OdeOptions,
) -> SolverResult<OdeSolution>
where
    F: FnMut(f64, &DVector<f64>) -> SolverResult<DVector<f64>>,
    T: FnMut(f64, &DVector<f64>) -> bool,
{
    let mut stepper = AdaptiveRk45::new(rhs, s0, s_end, y0.clone(), opts.clone())?;

    let mut s_out = vec![s0];
    let mut y_out = vec![y0];
    let mut terminated = false;

    for (s, y) in stepper.by_ref() {
        let stop = should_stop(s, &y);
        s_out.push(s);
        y_out.push(y);
        if stop {
            terminated = true;
            break;
        }
    }

    let status = if terminated {
        OdeStatus::Terminated
    } else {
        stepper.status().unwrap_or(OdeStatus::Stalled)
    };
    debug!(
        ?status,
        steps = stepper.steps_taken(),
        s_final = s_out.last().copied().unwrap_or(s0),
        "adaptive integration finished"
    );

    Ok(OdeSolution {
        s: s_out,
        y: y_out,
        status,
        steps_taken: stepper.steps_taken(),
    })
}
