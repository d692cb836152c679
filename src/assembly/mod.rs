//! Sparsity discovery and transport-matrix allocation.
//!
//! The numeric flux coefficients are assembled by the host; this module owns
//! the structure only.

pub mod sparsity;

pub use sparsity::{SparsityPattern, build_sparsity};

use num_traits::Float;

use crate::error::TracerError;
use crate::matrix::{CsrBuilder, CsrMatrix};

/// Allocate a square matrix whose rows follow `pattern`, values zero.
///
/// Row sizes are declared first, then every row is filled with its neighbour
/// indices, mirroring how the structure is fixed once per topology.
pub fn allocate_matrix<T: Float>(pattern: &SparsityPattern) -> Result<CsrMatrix<T>, TracerError> {
    let n = pattern.len();
    let mut builder = CsrBuilder::<T>::new(n, n);
    for row in 0..n {
        builder.set_row_size(row, pattern.row(row).len())?;
    }
    builder.end_row_sizes()?;
    for row in 0..n {
        for &col in pattern.row(row) {
            builder.add_index(row, col)?;
        }
    }
    builder.end_indices()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;

    #[test]
    fn allocated_matrix_matches_pattern() {
        let grid = CartesianGrid::new([2, 2, 1], [1.0; 3]).unwrap();
        let pattern = build_sparsity(&grid);
        let m: CsrMatrix<f64> = allocate_matrix(&pattern).unwrap();
        assert_eq!(m.nrows(), 4);
        assert_eq!(m.nnz(), pattern.nnz());
        let (row_ptr, col_idx) = pattern.to_csr();
        assert_eq!(m.row_ptr(), &row_ptr[..]);
        assert_eq!(m.col_idx(), &col_idx[..]);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(m.position(i, j).is_some(), pattern.contains(i, j));
            }
        }
    }
}
