//! Dense views on top of Faer.
//!
//! Transport matrices are always stored sparse; the dense form exists for
//! inspection and cross-checking small systems.

use crate::core::traits::MatVec;
use crate::matrix::sparse::CsrMatrix;
use faer::Mat;

/// Implements matrix-vector multiplication for `faer::Mat`.
///
/// Computes `y = A * x` where `A` is a dense matrix, `x` and `y` are vectors.
impl MatVec<Vec<f64>> for Mat<f64> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = 0.0;
            for j in 0..self.ncols() {
                y[i] += self[(i, j)] * x[j];
            }
        }
    }
}

impl CsrMatrix<f64> {
    /// Expand into a dense matrix; entries outside the structure are zero.
    pub fn to_dense(&self) -> Mat<f64> {
        let mut dense = Mat::<f64>::zeros(self.nrows(), self.ncols());
        for i in 0..self.nrows() {
            let (cols, vals) = self.row(i);
            for (&j, &v) in cols.iter().zip(vals) {
                dense[(i, j)] = v;
            }
        }
        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::sparse::SparseMatrix;

    #[test]
    fn dense_and_sparse_products_agree() {
        let a = CsrMatrix::from_csr(
            3, 3,
            vec![0, 2, 5, 7],
            vec![0, 1, 0, 1, 2, 1, 2],
            vec![4.0, -1.0, -1.0, 4.0, -1.0, -1.0, 4.0],
        )
        .unwrap();
        let dense = a.to_dense();
        assert_eq!(dense[(0, 2)], 0.0);
        assert_eq!(dense[(1, 0)], -1.0);
        let x = vec![1.0, 2.0, 3.0];
        let mut y_dense = vec![0.0; 3];
        let mut y_sparse = vec![0.0; 3];
        dense.matvec(&x, &mut y_dense);
        a.spmv(&x, &mut y_sparse);
        assert_eq!(y_dense, y_sparse);
    }
}
