//! A small Levenberg-Marquardt solver for dense least squares problems.
//!
//! Steps solve the Marquardt-scaled normal equations
//! `(J^T J + mu * diag(J^T J)) dx = -J^T r` and the damping `mu` follows
//! Nielsen's update rule. Termination follows MINPACK: relative cost
//! reduction, relative step size or gradient size.

use nalgebra::{
    DMatrix,
    DVector,
};
use tracing::trace;

use crate::config::FitConfig;
use crate::errors::FitError;

/// Damping beyond which no useful step can be expected.
const MAX_DAMPING: f64 = 1e30;
/// Floor for the Marquardt scaling of parameters with vanishing curvature.
const MIN_CURVATURE: f64 = 1e-12;

pub trait LeastSquaresProblem {
    fn parameter_count(&self) -> usize;

    /// Model minus observations, one entry per observation.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Derivatives of the residuals, one row per observation and one column
    /// per parameter.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;

    /// Moves `params` back into the feasible region.
    fn project(&self, _params: &mut DVector<f64>) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    CostReduction,
    StepSize,
    Gradient,
}

#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub params: DVector<f64>,
    pub iterations: usize,
    /// Half the residual sum of squares.
    pub cost: f64,
    pub termination: Termination,
}

struct Damping {
    mu: f64,
    nu: f64,
}

impl Damping {
    fn reject(&mut self) -> Result<(), FitError> {
        self.mu *= self.nu;
        self.nu *= 2.0;
        if self.mu > MAX_DAMPING || !self.mu.is_finite() {
            return Err(FitError::DampingOverflow);
        }
        Ok(())
    }

    fn accept(&mut self, rho: f64) {
        self.mu *= (1.0 / 3.0f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
        self.nu = 2.0;
    }
}

fn half_sum_of_squares(residuals: &DVector<f64>) -> Option<f64> {
    if residuals.iter().all(|r| r.is_finite()) {
        Some(0.5 * residuals.norm_squared())
    } else {
        None
    }
}

pub fn levenberg_marquardt<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    config: &FitConfig,
) -> Result<FitOutcome, FitError> {
    let n = problem.parameter_count();
    if initial.len() != n {
        return Err(FitError::ParameterCountMismatch {
            expected: n,
            real: initial.len(),
        });
    }

    let mut params = initial;
    problem.project(&mut params);
    let mut residuals = problem.residuals(&params);
    let mut cost = half_sum_of_squares(&residuals).ok_or(FitError::NonFiniteResiduals)?;
    let mut jacobian = problem.jacobian(&params);
    let mut damping = Damping {
        mu: (1e-3 * jacobian.tr_mul(&jacobian).diagonal().amax()).max(MIN_CURVATURE),
        nu: 2.0,
    };

    for iteration in 1..=config.max_iterations {
        let jtj = jacobian.tr_mul(&jacobian);
        let gradient = jacobian.tr_mul(&residuals);
        if gradient.amax() <= config.gtol {
            return Ok(FitOutcome {
                params,
                iterations: iteration,
                cost,
                termination: Termination::Gradient,
            });
        }
        let descent = -gradient.clone();

        loop {
            let mut damped = jtj.clone();
            for i in 0..n {
                damped[(i, i)] += damping.mu * jtj[(i, i)].max(MIN_CURVATURE);
            }
            let Some(factor) = damped.cholesky() else {
                damping.reject()?;
                continue;
            };

            let mut candidate = &params + factor.solve(&descent);
            problem.project(&mut candidate);
            let step = &candidate - &params;
            let candidate_residuals = problem.residuals(&candidate);
            let Some(candidate_cost) = half_sum_of_squares(&candidate_residuals) else {
                damping.reject()?;
                continue;
            };

            let predicted = -step.dot(&gradient) - 0.5 * step.dot(&(&jtj * &step));
            let actual = cost - candidate_cost;
            let rho = if predicted > 0.0 {
                actual / predicted
            } else {
                -1.0
            };
            if rho <= 0.0 {
                damping.reject()?;
                continue;
            }

            let cost_converged =
                actual <= config.ftol * cost && predicted <= config.ftol * cost;
            let step_converged = step.norm() <= config.xtol * (params.norm() + config.xtol);

            params = candidate;
            residuals = candidate_residuals;
            cost = candidate_cost;
            damping.accept(rho);
            trace!(
                "LM iteration {}: cost {:.6e}, mu {:.3e}",
                iteration,
                cost,
                damping.mu
            );

            let termination = if cost_converged {
                Some(Termination::CostReduction)
            } else if step_converged {
                Some(Termination::StepSize)
            } else {
                None
            };
            if let Some(termination) = termination {
                return Ok(FitOutcome {
                    params,
                    iterations: iteration,
                    cost,
                    termination,
                });
            }
            jacobian = problem.jacobian(&params);
            break;
        }
    }

    Err(FitError::MaxIterationsReached {
        iterations: config.max_iterations,
    })
}
