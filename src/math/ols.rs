//! Least squares solvers.
//!
//! Every fit in this crate ends in a small linear problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + Σ_j λ_j β_j^2
//! ```
//!
//! The penalty is handled by appending one pseudo-observation row per
//! penalized coefficient (`sqrt(λ_j)` in column `j`, target 0) and solving the
//! stacked system as ordinary least squares.
//!
//! Implementation choices:
//! - SVD rather than QR: the stacked matrix is tall, and nalgebra's
//!   `QR::solve` is intended for square systems.
//! - Parameter counts stay small (a few dozen columns at most), so SVD cost is
//!   negligible next to the uncertainty simulation.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve a ridge-penalized least squares problem.
///
/// `penalty[j]` is the precision `λ_j` applied to coefficient `j`; zero leaves
/// the coefficient unpenalized. `penalty.len()` must equal `x.ncols()`.
pub fn solve_penalized(x: &DMatrix<f64>, y: &DVector<f64>, penalty: &[f64]) -> Option<DVector<f64>> {
    let n = x.nrows();
    let p = x.ncols();
    if penalty.len() != p || y.len() != n {
        return None;
    }

    let penalized: Vec<(usize, f64)> = penalty
        .iter()
        .enumerate()
        .filter(|(_, lambda)| **lambda > 0.0)
        .map(|(j, lambda)| (j, lambda.sqrt()))
        .collect();
    if penalized.iter().any(|(_, s)| !s.is_finite()) {
        return None;
    }

    let rows = n + penalized.len();
    let mut xs = DMatrix::<f64>::zeros(rows, p);
    let mut ys = DVector::<f64>::zeros(rows);
    xs.rows_mut(0, n).copy_from(x);
    ys.rows_mut(0, n).copy_from(y);
    for (k, (j, s)) in penalized.iter().enumerate() {
        xs[(n + k, *j)] = *s;
    }

    solve_least_squares(&xs, &ys)
}
