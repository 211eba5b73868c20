//! Correlation matrices and Cholesky factors for multi-asset simulation.

use crate::types::CorrelationError;

const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Validated correlation matrix stored row-major.
///
/// # Examples
///
/// ```
/// use pricer_core::math::correlation::CorrelationMatrix;
///
/// let corr = CorrelationMatrix::new(&[1.0, 0.5, 0.5, 1.0], 2).unwrap();
/// let chol = corr.cholesky().unwrap();
/// let w = chol.transform(&[1.0, 0.0]);
/// assert!((w[1] - 0.5).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl CorrelationMatrix {
    /// Builds a matrix from row-major data, checking shape, unit diagonal,
    /// symmetry and the `[-1, 1]` range.
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        if data.len() != dim * dim {
            return Err(CorrelationError::InvalidDimension {
                expected: dim * dim,
                actual: data.len(),
            });
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > SYMMETRY_TOLERANCE {
                return Err(CorrelationError::InvalidValue {
                    row: i,
                    col: i,
                    value: diag,
                });
            }
            for j in 0..dim {
                let value = data[i * dim + j];
                if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
                    return Err(CorrelationError::InvalidValue {
                        row: i,
                        col: j,
                        value,
                    });
                }
                if (value - data[j * dim + i]).abs() > SYMMETRY_TOLERANCE {
                    return Err(CorrelationError::NotSymmetric { row: i, col: j });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Identity correlation (independent assets).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Lower-triangular Cholesky factor `L` with `L Lᵀ = C`.
    pub fn cholesky(&self) -> Result<CholeskyFactor, CorrelationError> {
        let n = self.dim;
        let mut lower = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..=i {
                let sum: f64 = (0..j).map(|k| lower[i * n + k] * lower[j * n + k]).sum();

                if i == j {
                    let diag = self.get(i, i) - sum;
                    if diag <= 0.0 {
                        return Err(CorrelationError::NotPositiveDefinite);
                    }
                    lower[i * n + i] = diag.sqrt();
                } else {
                    let l_jj = lower[j * n + j];
                    if l_jj <= 0.0 {
                        return Err(CorrelationError::NotPositiveDefinite);
                    }
                    lower[i * n + j] = (self.get(i, j) - sum) / l_jj;
                }
            }
        }

        Ok(CholeskyFactor { data: lower, dim: n })
    }
}

/// Lower triangular Cholesky factor of a correlation matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j); zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if j > i {
            0.0
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Maps independent standard normals `z` to correlated normals `L z`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut out = z.to_vec();
        self.transform_inplace(&mut out);
        out
    }

    /// In-place variant of [`transform`](Self::transform).
    ///
    /// Rows are processed bottom-up so each row only reads untouched inputs.
    pub fn transform_inplace(&self, z: &mut [f64]) {
        let n = self.dim.min(z.len());
        for i in (0..n).rev() {
            let mut acc = 0.0;
            for (j, zj) in z.iter().enumerate().take(i + 1) {
                acc += self.data[i * self.dim + j] * zj;
            }
            z[i] = acc;
        }
    }
}
