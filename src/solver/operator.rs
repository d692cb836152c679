//! Communication-aware linear operator for overlapping decompositions.

use crate::core::traits::MatVec;
use crate::matrix::{CsrMatrix, SparseMatrix};
use crate::parallel::CellOwnership;

/// y = A x on the rank-local matrix, with copy rows zeroed afterwards.
///
/// Copy cells are ghosts whose rows are incomplete on this rank; their
/// entries are excluded from the local operator.
pub struct OverlappingSchwarzOperator<'a> {
    a: &'a CsrMatrix<f64>,
    ownership: &'a CellOwnership,
}

impl<'a> OverlappingSchwarzOperator<'a> {
    pub fn new(a: &'a CsrMatrix<f64>, ownership: &'a CellOwnership) -> Self {
        assert_eq!(
            a.nrows(),
            ownership.len(),
            "local matrix and ownership descriptor disagree on the cell count"
        );
        Self { a, ownership }
    }

    pub fn matrix(&self) -> &CsrMatrix<f64> {
        self.a
    }
}

impl MatVec<Vec<f64>> for OverlappingSchwarzOperator<'_> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        self.a.spmv(x, y);
        self.ownership.project(y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::CellAttributes;

    #[test]
    fn copy_rows_are_projected_out() {
        let a = CsrMatrix::<f64>::identity(2);
        let own = CellOwnership::new(vec![CellAttributes::OWNER, CellAttributes::COPY]);
        let op = OverlappingSchwarzOperator::new(&a, &own);
        let mut y = vec![0.0; 2];
        op.matvec(&vec![2.0, 3.0], &mut y);
        assert_eq!(y, vec![2.0, 0.0]);
    }
}
