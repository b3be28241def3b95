//! Small dense linear algebra helpers for the regression-based fitters.

/// Solve a symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b. Returns None if A is not positive definite.
pub(crate) fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let l = cholesky(a, b.len())?;
    Some(substitute(&l, b))
}

/// Diagonal of the inverse of a symmetric positive definite matrix.
///
/// Used for coefficient standard errors: diag((X'X)^-1).
pub(crate) fn symmetric_inverse_diagonal(a: &[Vec<f64>]) -> Option<Vec<f64>> {
    let n = a.len();
    let l = cholesky(a, n)?;
    let mut diag = Vec::with_capacity(n);
    for i in 0..n {
        let mut e = vec![0.0; n];
        e[i] = 1.0;
        diag.push(substitute(&l, &e)[i]);
    }
    Some(diag)
}

fn cholesky(a: &[Vec<f64>], n: usize) -> Option<Vec<Vec<f64>>> {
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= 0.0 {
                    return None; // Not positive definite
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }
    Some(l)
}

fn substitute(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }
    x
}

/// Weighted least squares over explicit design columns.
pub(crate) fn weighted_least_squares(
    columns: &[Vec<f64>],
    y: &[f64],
    weights: &[f64],
) -> Option<Vec<f64>> {
    let (xtx, xty) = normal_equations(columns, y, Some(weights))?;
    solve_symmetric(&xtx, &xty)
}

/// Build X'WX and X'Wy for the normal equations.
pub(crate) fn normal_equations(
    columns: &[Vec<f64>],
    y: &[f64],
    weights: Option<&[f64]>,
) -> Option<(Vec<Vec<f64>>, Vec<f64>)> {
    let p = columns.len();
    let n = y.len();
    if p == 0 || n == 0 {
        return None;
    }
    for col in columns {
        if col.len() != n {
            return None;
        }
    }
    if let Some(w) = weights {
        if w.len() != n {
            return None;
        }
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for obs in 0..n {
        let w = weights.map(|w| w[obs]).unwrap_or(1.0);
        for i in 0..p {
            let xi = columns[i][obs];
            xty[i] += w * xi * y[obs];
            for j in 0..=i {
                xtx[i][j] += w * xi * columns[j][obs];
            }
        }
    }
    for i in 0..p {
        for j in (i + 1)..p {
            xtx[i][j] = xtx[j][i];
        }
        // Ridge term for numerical stability
        xtx[i][i] += 1e-10;
    }

    Some((xtx, xty))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn solve_symmetric_identity() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let b = vec![3.0, -2.0];
        let x = solve_symmetric(&a, &b).unwrap();
        assert_relative_eq!(x[0], 3.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], -2.0, epsilon = 1e-10);
    }

    #[test]
    fn solve_symmetric_known_system() {
        // A = [[4, 2], [2, 3]], b = [10, 8] -> x = [7/4, 3/2]
        let a = vec![vec![4.0, 2.0], vec![2.0, 3.0]];
        let b = vec![10.0, 8.0];
        let x = solve_symmetric(&a, &b).unwrap();
        assert_relative_eq!(x[0], 1.75, epsilon = 1e-10);
        assert_relative_eq!(x[1], 1.5, epsilon = 1e-10);
    }

    #[test]
    fn solve_symmetric_rejects_non_positive_definite() {
        let a = vec![vec![0.0, 0.0], vec![0.0, 0.0]];
        let b = vec![1.0, 1.0];
        assert!(solve_symmetric(&a, &b).is_none());
    }

    #[test]
    fn inverse_diagonal_of_diagonal_matrix() {
        let a = vec![vec![4.0, 0.0], vec![0.0, 2.0]];
        let d = symmetric_inverse_diagonal(&a).unwrap();
        assert_relative_eq!(d[0], 0.25, epsilon = 1e-10);
        assert_relative_eq!(d[1], 0.5, epsilon = 1e-10);
    }

    #[test]
    fn weighted_least_squares_downweights_outlier() {
        // Line y = x with one gross outlier carrying near-zero weight
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let mut y: Vec<f64> = x.clone();
        y[5] = 100.0;
        let mut w = vec![1.0; 10];
        w[5] = 1e-9;
        let ones = vec![1.0; 10];

        let beta = weighted_least_squares(&[ones, x], &y, &w).unwrap();
        assert_relative_eq!(beta[0], 0.0, epsilon = 1e-4);
        assert_relative_eq!(beta[1], 1.0, epsilon = 1e-4);
    }
}
