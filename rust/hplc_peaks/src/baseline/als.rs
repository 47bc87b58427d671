use tracing::{
    debug,
    warn,
};

use super::banded::Pentadiagonal;

/// Smallest series the second-difference penalty is defined for.
pub const MIN_SOLVE_LEN: usize = 3;

/// Asymmetric least squares smoothing.
///
/// Repeatedly solves `(W + lambda * D * D^T) z = W y` and reweights every
/// sample with `asymmetry` when it lies above the current estimate and
/// `1 - asymmetry` when below. Samples sitting exactly on the estimate get no
/// weight. With `asymmetry = 0` the estimate settles on the lower envelope of
/// `y`.
///
/// Iteration stops early, keeping the last good estimate, if the reweighted
/// system can no longer be factorized.
///
/// # Panics
/// Panics when `iterations == 0` or `y` is shorter than [`MIN_SOLVE_LEN`];
/// configuration validation rules both out before this is reached.
pub fn asymmetric_least_squares(
    y: &[f64],
    lambda: f64,
    asymmetry: f64,
    iterations: usize,
) -> Vec<f64> {
    assert!(iterations > 0, "asymmetric least squares needs at least one iteration");
    assert!(
        y.len() >= MIN_SOLVE_LEN,
        "asymmetric least squares needs at least {} samples, got {}",
        MIN_SOLVE_LEN,
        y.len()
    );

    let n = y.len();
    let penalty = Pentadiagonal::second_difference_penalty(n, lambda);
    let mut weights = vec![1.0; n];
    // Overwritten by the first solve, which is always positive definite.
    let mut z = y.to_vec();

    for iteration in 0..iterations {
        let rhs: Vec<f64> = weights.iter().zip(y).map(|(w, v)| w * v).collect();
        match penalty.with_added_diagonal(&weights).solve(&rhs) {
            Some(solution) => z = solution,
            None => {
                warn!(
                    "Baseline system became singular at iteration {}, keeping previous estimate",
                    iteration
                );
                break;
            }
        }

        for ((w, yi), zi) in weights.iter_mut().zip(y).zip(z.iter()) {
            *w = if yi > zi {
                asymmetry
            } else if yi < zi {
                1.0 - asymmetry
            } else {
                0.0
            };
        }

        let weighted = weights.iter().filter(|w| **w > 0.0).count();
        if weighted < 2 {
            debug!(
                "Only {} weighted samples left after iteration {}, stopping",
                weighted, iteration
            );
            break;
        }
    }
    z
}
