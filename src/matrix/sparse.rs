// SparseMatrix trait, CSR storage and its two-stage builder

use std::marker::PhantomData;

use num_traits::Float;

use crate::core::traits::MatVec;
use crate::error::TracerError;

/// A read‐only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Compressed sparse row matrix with a fixed structure.
///
/// Column indices are sorted within each row. Once built the structure never
/// changes; only values may be written, and only at positions that are part
/// of the structure.
#[derive(Clone, Debug, PartialEq)]
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row‐ptr, col‐idx, and values.
    ///
    /// Rows must have strictly increasing column indices.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, TracerError> {
        if row_ptr.len() != nrows + 1 || row_ptr[0] != 0 {
            return Err(TracerError::DimensionMismatch(format!(
                "row pointer of length {} for {} rows",
                row_ptr.len(),
                nrows
            )));
        }
        let nnz = row_ptr[nrows];
        if col_idx.len() != nnz || values.len() != nnz {
            return Err(TracerError::DimensionMismatch(format!(
                "{} column indices and {} values for {} nonzeros",
                col_idx.len(),
                values.len(),
                nnz
            )));
        }
        if let Some(i) = row_ptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(TracerError::Logic(format!("row pointer decreases at row {i}")));
        }
        for i in 0..nrows {
            let cols = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            if cols.windows(2).any(|w| w[0] >= w[1]) || cols.iter().any(|&c| c >= ncols) {
                return Err(TracerError::Logic(format!(
                    "row {i} has unsorted, duplicate or out-of-range column indices"
                )));
            }
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    /// n×n identity.
    pub fn identity(n: usize) -> Self {
        Self {
            nrows: n,
            ncols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![T::one(); n],
        }
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Column indices and values of row `i`.
    pub fn row(&self, i: usize) -> (&[usize], &[T]) {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        (&self.col_idx[range.clone()], &self.values[range])
    }

    /// Storage position of entry (i, j), if it is part of the structure.
    pub fn position(&self, i: usize, j: usize) -> Option<usize> {
        if i >= self.nrows {
            return None;
        }
        let start = self.row_ptr[i];
        self.col_idx[start..self.row_ptr[i + 1]]
            .binary_search(&j)
            .ok()
            .map(|k| start + k)
    }

    /// Value at (i, j); zero outside the structure.
    pub fn get(&self, i: usize, j: usize) -> T {
        self.position(i, j).map_or(T::zero(), |k| self.values[k])
    }

    /// Mutable access to a structural entry.
    pub fn entry_mut(&mut self, i: usize, j: usize) -> Result<&mut T, TracerError> {
        match self.position(i, j) {
            Some(k) => Ok(&mut self.values[k]),
            None => Err(TracerError::Logic(format!(
                "entry ({i}, {j}) is not part of the finalized matrix structure"
            ))),
        }
    }

    /// a(i, j) += v
    pub fn add_to(&mut self, i: usize, j: usize, v: T) -> Result<(), TracerError> {
        let e = self.entry_mut(i, j)?;
        *e = *e + v;
        Ok(())
    }

    /// Reset every value to zero, keeping the structure.
    pub fn set_zero(&mut self) {
        self.values.iter_mut().for_each(|v| *v = T::zero());
    }

    fn row_dot(&self, i: usize, x: &[T]) -> T {
        let (cols, vals) = self.row(i);
        cols.iter()
            .zip(vals)
            .fold(T::zero(), |acc, (&j, &v)| acc + v * x[j])
    }
}

impl<T: Float + Send + Sync> SparseMatrix<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            y.par_iter_mut()
                .enumerate()
                .for_each(|(i, yi)| *yi = self.row_dot(i, x));
        }
        #[cfg(not(feature = "rayon"))]
        {
            for (i, yi) in y.iter_mut().enumerate() {
                *yi = self.row_dot(i, x);
            }
        }
    }
}

impl<T: Float + Send + Sync> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuildStage {
    RowSizes,
    Indices,
}

/// Two-stage CSR construction: declare every row size, then fill indices.
///
/// Calls made in the wrong stage, more indices than declared for a row, or
/// rows left short when finishing are logic errors.
pub struct CsrBuilder<T> {
    nrows: usize,
    ncols: usize,
    stage: BuildStage,
    row_sizes: Vec<usize>,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    filled: Vec<usize>,
    _marker: PhantomData<T>,
}

impl<T: Float> CsrBuilder<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            stage: BuildStage::RowSizes,
            row_sizes: vec![0; nrows],
            row_ptr: Vec::new(),
            col_idx: Vec::new(),
            filled: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn expect_stage(&self, stage: BuildStage, op: &str) -> Result<(), TracerError> {
        if self.stage != stage {
            return Err(TracerError::Logic(format!(
                "{op} called in stage {:?}, expected {stage:?}",
                self.stage
            )));
        }
        Ok(())
    }

    pub fn set_row_size(&mut self, row: usize, size: usize) -> Result<(), TracerError> {
        self.expect_stage(BuildStage::RowSizes, "set_row_size")?;
        if row >= self.nrows || size > self.ncols {
            return Err(TracerError::DimensionMismatch(format!(
                "row {row} of size {size} in a {}x{} matrix",
                self.nrows, self.ncols
            )));
        }
        self.row_sizes[row] = size;
        Ok(())
    }

    pub fn end_row_sizes(&mut self) -> Result<(), TracerError> {
        self.expect_stage(BuildStage::RowSizes, "end_row_sizes")?;
        self.row_ptr = Vec::with_capacity(self.nrows + 1);
        self.row_ptr.push(0);
        let mut acc = 0;
        for &s in &self.row_sizes {
            acc += s;
            self.row_ptr.push(acc);
        }
        self.col_idx = vec![usize::MAX; acc];
        self.filled = vec![0; self.nrows];
        self.stage = BuildStage::Indices;
        Ok(())
    }

    /// Add column `col` to row `row`. Adding an index twice is a no-op.
    pub fn add_index(&mut self, row: usize, col: usize) -> Result<(), TracerError> {
        self.expect_stage(BuildStage::Indices, "add_index")?;
        if row >= self.nrows || col >= self.ncols {
            return Err(TracerError::DimensionMismatch(format!(
                "index ({row}, {col}) in a {}x{} matrix",
                self.nrows, self.ncols
            )));
        }
        let start = self.row_ptr[row];
        let used = self.filled[row];
        if self.col_idx[start..start + used].contains(&col) {
            return Ok(());
        }
        if used == self.row_sizes[row] {
            return Err(TracerError::Logic(format!(
                "row {row} already holds its declared {} indices",
                used
            )));
        }
        self.col_idx[start + used] = col;
        self.filled[row] += 1;
        Ok(())
    }

    /// Finish the structure; values start at zero.
    pub fn end_indices(mut self) -> Result<CsrMatrix<T>, TracerError> {
        self.expect_stage(BuildStage::Indices, "end_indices")?;
        for row in 0..self.nrows {
            if self.filled[row] != self.row_sizes[row] {
                return Err(TracerError::Logic(format!(
                    "row {row} declared {} indices but received {}",
                    self.row_sizes[row], self.filled[row]
                )));
            }
            self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]].sort_unstable();
        }
        let nnz = self.col_idx.len();
        Ok(CsrMatrix {
            nrows: self.nrows,
            ncols: self.ncols,
            row_ptr: self.row_ptr,
            col_idx: self.col_idx,
            values: vec![T::zero(); nnz],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_spmv() {
        // 3×3 identity in CSR: row_ptr=[0,1,2,3], col_idx=[0,1,2], vals=[1,1,1]
        let m = CsrMatrix::from_csr(3, 3, vec![0, 1, 2, 3], vec![0, 1, 2], vec![1.0, 1.0, 1.0]).unwrap();
        let x = vec![2.0, 3.0, 5.0];
        let mut y = vec![0.0; 3];
        m.spmv(&x, &mut y);
        assert_eq!(y, x);
        assert_eq!(m, CsrMatrix::identity(3));
    }

    #[test]
    fn simple_pattern() {
        // 2×3 matrix [[1,2,0],[0,3,4]]
        let m = CsrMatrix::from_csr(
            2, 3,
            vec![0, 2, 4],
            vec![0, 1, 1, 2],
            vec![1.0, 2.0, 3.0, 4.0],
        ).unwrap();
        let x = vec![1.0, 1.0, 1.0];
        let mut y = vec![0.0; 2];
        m.spmv(&x, &mut y);
        assert_eq!(y, vec![3.0, 7.0]);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.get(1, 2), 4.0);
    }

    #[test]
    fn from_csr_rejects_unsorted_row() {
        let err = CsrMatrix::from_csr(1, 2, vec![0, 2], vec![1, 0], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, TracerError::Logic(_)));
    }

    #[test]
    fn from_csr_rejects_decreasing_row_pointer() {
        // row 0 would end past nnz before row 1 is checked
        let err = CsrMatrix::from_csr(2, 2, vec![0, 5, 2], vec![0, 1], vec![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, TracerError::Logic(_)));
    }

    #[test]
    fn builder_sorts_and_dedups() {
        let mut b = CsrBuilder::<f64>::new(2, 2);
        b.set_row_size(0, 2).unwrap();
        b.set_row_size(1, 1).unwrap();
        b.end_row_sizes().unwrap();
        b.add_index(0, 1).unwrap();
        b.add_index(0, 0).unwrap();
        b.add_index(0, 1).unwrap();
        b.add_index(1, 1).unwrap();
        let m = b.end_indices().unwrap();
        assert_eq!(m.row_ptr(), &[0, 2, 3]);
        assert_eq!(m.col_idx(), &[0, 1, 1]);
        assert!(m.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn builder_rejects_out_of_order_calls() {
        let mut b = CsrBuilder::<f64>::new(1, 1);
        assert!(matches!(b.add_index(0, 0), Err(TracerError::Logic(_))));
        b.set_row_size(0, 1).unwrap();
        b.end_row_sizes().unwrap();
        assert!(matches!(b.set_row_size(0, 1), Err(TracerError::Logic(_))));
    }

    #[test]
    fn builder_rejects_overfull_and_short_rows() {
        let mut b = CsrBuilder::<f64>::new(2, 2);
        b.set_row_size(0, 1).unwrap();
        b.set_row_size(1, 1).unwrap();
        b.end_row_sizes().unwrap();
        b.add_index(0, 0).unwrap();
        assert!(matches!(b.add_index(0, 1), Err(TracerError::Logic(_))));
        assert!(matches!(b.end_indices(), Err(TracerError::Logic(_))));
    }

    #[test]
    fn writing_outside_structure_is_a_logic_error() {
        let mut m = CsrMatrix::<f64>::identity(2);
        m.add_to(1, 1, 2.5).unwrap();
        assert_eq!(m.get(1, 1), 3.5);
        assert!(matches!(m.entry_mut(0, 1), Err(TracerError::Logic(_))));
        m.set_zero();
        assert_eq!(m.get(1, 1), 0.0);
    }
}
