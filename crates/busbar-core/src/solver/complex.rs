use anyhow::{anyhow, Result};
use num_complex::Complex64;

use super::backend::LinearSystemBackend;

/// Invert a dense complex matrix `G + jB` with a real backend.
///
/// The matrix is embedded once as the real 2N problem
///
/// ```text
/// [ G  -B ] [ Re x ]   [ Re r ]
/// [ B   G ] [ Im x ] = [ Im r ]
/// ```
///
/// and solved against every unit vector in a single
/// [`solve_many`](LinearSystemBackend::solve_many) call. Returns the inverse
/// as a list of columns.
pub fn invert_complex(
    backend: &dyn LinearSystemBackend,
    matrix: &[Vec<Complex64>],
) -> Result<Vec<Vec<Complex64>>> {
    let n = matrix.len();
    let mut real = vec![vec![0.0; 2 * n]; 2 * n];
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != n {
            return Err(anyhow!("matrix must be square"));
        }
        for (j, y) in row.iter().enumerate() {
            real[i][j] = y.re;
            real[i][n + j] = -y.im;
            real[n + i][j] = y.im;
            real[n + i][n + j] = y.re;
        }
    }

    // a real unit rhs is enough: its imaginary half stays zero
    let units: Vec<Vec<f64>> = (0..n)
        .map(|j| {
            let mut unit = vec![0.0; 2 * n];
            unit[j] = 1.0;
            unit
        })
        .collect();

    let columns = backend.solve_many(&real, &units)?;
    Ok(columns
        .into_iter()
        .map(|x| (0..n).map(|i| Complex64::new(x[i], x[n + i])).collect())
        .collect())
}
