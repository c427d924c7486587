//! Small dense linear algebra helpers for state-space models.

/// Dense row-major square matrix.
pub type Matrix = Vec<Vec<f64>>;

/// An `n x n` matrix of zeros.
pub fn zeros(n: usize) -> Matrix {
    vec![vec![0.0; n]; n]
}

/// Matrix product `a * b` for square matrices of equal size.
pub fn matmul(a: &Matrix, b: &Matrix) -> Matrix {
    let n = a.len();
    let mut out = zeros(n);
    for i in 0..n {
        for k in 0..n {
            let aik = a[i][k];
            if aik == 0.0 {
                continue;
            }
            for j in 0..n {
                out[i][j] += aik * b[k][j];
            }
        }
    }
    out
}

/// Transpose of a square matrix.
pub fn transpose(a: &Matrix) -> Matrix {
    let n = a.len();
    let mut out = zeros(n);
    for i in 0..n {
        for j in 0..n {
            out[j][i] = a[i][j];
        }
    }
    out
}

/// Matrix-vector product.
pub fn matvec(a: &Matrix, x: &[f64]) -> Vec<f64> {
    a.iter()
        .map(|row| row.iter().zip(x).map(|(r, v)| r * v).sum())
        .collect()
}

/// Solve a linear system Ax = b using Gaussian elimination with partial pivoting.
///
/// Returns `None` when the system is singular.
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut aug: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }

        if max_val < 1e-14 {
            return None;
        }

        aug.swap(col, max_row);

        for row in (col + 1)..n {
            let factor = aug[row][col] / aug[col][col];
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}

/// Solve the discrete Lyapunov equation `P = T P T' + Q` for `P`.
///
/// Uses the vectorized form `(I - T (x) T) vec(P) = vec(Q)`; only meant for the
/// handful of states an ARMA model needs.
pub fn solve_discrete_lyapunov(t: &Matrix, q: &Matrix) -> Option<Matrix> {
    let n = t.len();
    let m = n * n;
    let mut a = vec![vec![0.0; m]; m];
    let mut b = vec![0.0; m];

    for i in 0..n {
        for j in 0..n {
            let row = i * n + j;
            b[row] = q[i][j];
            a[row][row] += 1.0;
            for k in 0..n {
                for l in 0..n {
                    a[row][k * n + l] -= t[i][k] * t[j][l];
                }
            }
        }
    }

    let flat = solve_linear_system(&a, &b)?;
    Some(flat.chunks(n).map(|c| c.to_vec()).collect())
}
