use anyhow::{anyhow, Result};
use faer::{prelude::*, solvers::PartialPivLu, Mat};

/// Solves dense real systems `A·x = b`.
///
/// Used for Newton-Raphson corrections, the fast-decoupled B′/B″ systems,
/// the DC angle solve and (through [`invert_complex`](super::invert_complex))
/// impedance matrices.
pub trait LinearSystemBackend: Send + Sync {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>>;

    /// Solve against several right-hand sides, factoring `matrix` once.
    ///
    /// `rhs` and the result are lists of columns.
    fn solve_many(&self, matrix: &[Vec<f64>], rhs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rhs.iter().map(|column| self.solve(matrix, column)).collect()
    }
}

fn check_dimensions(matrix: &[Vec<f64>], rhs: &[f64]) -> Result<()> {
    let n = matrix.len();
    if rhs.len() != n {
        return Err(anyhow!(
            "rhs length ({}) does not match matrix dimension {}",
            rhs.len(),
            n
        ));
    }
    if matrix.iter().any(|row| row.len() != n) {
        return Err(anyhow!("matrix must be square"));
    }
    Ok(())
}

/// Gaussian elimination with partial pivoting.
#[derive(Debug, Clone, Default)]
pub struct GaussSolver;

impl GaussSolver {
    /// Gauss-Jordan elimination on `matrix` with `b[row][col]` carried along.
    fn eliminate(matrix: &[Vec<f64>], mut b: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>> {
        let n = matrix.len();
        let mut a = matrix.to_vec();

        for i in 0..n {
            let mut pivot = i;
            for row in i + 1..n {
                if a[row][i].abs() > a[pivot][i].abs() {
                    pivot = row;
                }
            }
            if pivot != i {
                a.swap(i, pivot);
                b.swap(i, pivot);
            }

            let diag = a[i][i];
            if diag.abs() < 1e-12 {
                return Err(anyhow!("singular matrix (zero pivot in column {})", i));
            }

            for value in a[i][i..].iter_mut() {
                *value /= diag;
            }
            for value in b[i].iter_mut() {
                *value /= diag;
            }

            let pivot_segment = a[i][i..].to_vec();
            let pivot_rhs = b[i].clone();
            for row in 0..n {
                if row == i {
                    continue;
                }
                let factor = a[row][i];
                if factor == 0.0 {
                    continue;
                }
                for (target, &pivot) in a[row][i..].iter_mut().zip(pivot_segment.iter()) {
                    *target -= factor * pivot;
                }
                for (target, &pivot) in b[row].iter_mut().zip(pivot_rhs.iter()) {
                    *target -= factor * pivot;
                }
            }
        }

        Ok(b)
    }
}

impl LinearSystemBackend for GaussSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>> {
        if matrix.is_empty() {
            return Ok(Vec::new());
        }
        check_dimensions(matrix, rhs)?;

        let b = rhs.iter().map(|&value| vec![value]).collect();
        Ok(Self::eliminate(matrix, b)?
            .into_iter()
            .map(|row| row[0])
            .collect())
    }

    fn solve_many(&self, matrix: &[Vec<f64>], rhs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let n = matrix.len();
        if n == 0 || rhs.is_empty() {
            return Ok(rhs.iter().map(|_| Vec::new()).collect());
        }
        for column in rhs {
            check_dimensions(matrix, column)?;
        }

        let b = (0..n)
            .map(|i| rhs.iter().map(|column| column[i]).collect())
            .collect();
        let rows = Self::eliminate(matrix, b)?;
        Ok((0..rhs.len())
            .map(|k| rows.iter().map(|row| row[k]).collect())
            .collect())
    }
}

/// LU with partial pivoting from faer.
#[derive(Debug, Clone, Default)]
pub struct FaerSolver;

impl LinearSystemBackend for FaerSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>> {
        let mut columns = self.solve_many(matrix, &[rhs.to_vec()])?;
        Ok(columns.pop().unwrap_or_default())
    }

    fn solve_many(&self, matrix: &[Vec<f64>], rhs: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let n = matrix.len();
        if n == 0 || rhs.is_empty() {
            return Ok(rhs.iter().map(|_| Vec::new()).collect());
        }
        for column in rhs {
            check_dimensions(matrix, column)?;
        }

        let mat = Mat::from_fn(n, n, |i, j| matrix[i][j]);
        let rhs_mat = Mat::from_fn(n, rhs.len(), |i, k| rhs[k][i]);
        let lu = PartialPivLu::new(mat.as_ref());
        let sol = lu.solve(&rhs_mat);

        let mut columns = Vec::with_capacity(rhs.len());
        for k in 0..rhs.len() {
            let mut column = Vec::with_capacity(n);
            for i in 0..n {
                let value = sol.read(i, k);
                // faer does not report singularity; it shows up as inf/NaN
                if !value.is_finite() {
                    return Err(anyhow!("singular matrix (non-finite solution entry {})", i));
                }
                column.push(value);
            }
            columns.push(column);
        }
        Ok(columns)
    }
}
