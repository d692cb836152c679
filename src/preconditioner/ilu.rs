//! ILU(0) factorization with zero fill (Saad §10.3).
//!
//! The factors share the sparsity structure of the matrix: L (unit lower,
//! diagonal implied) and U are stored in place of A's values. The pivots are
//! kept apart so that a row without a structural diagonal still has one.
//!
//! Setup never fails on a singular row. A pivot that is missing or smaller
//! than [`SINGULAR_LIMIT`] is replaced by one; the Krylov method then reports
//! whether the preconditioned system converged.

use crate::error::TracerError;
use crate::matrix::CsrMatrix;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Pivots smaller than this in magnitude are treated as zero.
pub const SINGULAR_LIMIT: f64 = 1e-30;

pub struct Ilu0<T> {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    /// End of the strictly lower part of each row.
    lower_end: Vec<usize>,
    /// Start of the strictly upper part of each row.
    upper_start: Vec<usize>,
    pivot: Vec<T>,
    lu: Vec<T>,
    replaced: Vec<usize>,
    ready: bool,
}

impl<T: Float> Ilu0<T> {
    pub fn new() -> Self {
        Self {
            n: 0,
            row_ptr: Vec::new(),
            col_idx: Vec::new(),
            lower_end: Vec::new(),
            upper_start: Vec::new(),
            pivot: Vec::new(),
            lu: Vec::new(),
            replaced: Vec::new(),
            ready: false,
        }
    }

    /// Dimension of the factorized matrix.
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Rows whose pivot was missing or singular and was replaced by one.
    pub fn replaced_pivots(&self) -> &[usize] {
        &self.replaced
    }
}

impl<T: Float> Default for Ilu0<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float> Preconditioner<CsrMatrix<T>, Vec<T>> for Ilu0<T> {
    fn setup(&mut self, a: &CsrMatrix<T>) -> Result<(), TracerError> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(TracerError::DimensionMismatch(format!(
                "ILU(0) needs a square matrix, got {}x{}",
                n,
                a.ncols()
            )));
        }
        let limit = T::from(SINGULAR_LIMIT).unwrap_or_else(T::min_positive_value);
        let row_ptr = a.row_ptr().to_vec();
        let col_idx = a.col_idx().to_vec();
        let mut lu = a.values().to_vec();
        let mut lower_end = Vec::with_capacity(n);
        let mut upper_start = Vec::with_capacity(n);
        for i in 0..n {
            let row = &col_idx[row_ptr[i]..row_ptr[i + 1]];
            lower_end.push(row_ptr[i] + row.partition_point(|&c| c < i));
            upper_start.push(row_ptr[i] + row.partition_point(|&c| c <= i));
        }
        let mut pivot = vec![T::one(); n];
        let mut replaced = Vec::new();

        // iw[j] = storage position of (i, j) in the current row, if structural
        let mut iw = vec![usize::MAX; n];
        for i in 0..n {
            for k in row_ptr[i]..row_ptr[i + 1] {
                iw[col_idx[k]] = k;
            }
            for kk in row_ptr[i]..lower_end[i] {
                let c = col_idx[kk];
                let m = lu[kk] / pivot[c];
                lu[kk] = m;
                for jj in upper_start[c]..row_ptr[c + 1] {
                    let pos = iw[col_idx[jj]];
                    if pos != usize::MAX {
                        lu[pos] = lu[pos] - m * lu[jj];
                    }
                }
            }
            let d = if lower_end[i] < upper_start[i] { lu[lower_end[i]] } else { T::zero() };
            if d.abs() < limit {
                replaced.push(i);
            } else {
                pivot[i] = d;
            }
            for k in row_ptr[i]..row_ptr[i + 1] {
                iw[col_idx[k]] = usize::MAX;
            }
        }
        if !replaced.is_empty() {
            log::warn!(
                "ILU(0): {} singular pivot(s) replaced by one, first at row {}",
                replaced.len(),
                replaced[0]
            );
        }

        self.n = n;
        self.row_ptr = row_ptr;
        self.col_idx = col_idx;
        self.lower_end = lower_end;
        self.upper_start = upper_start;
        self.pivot = pivot;
        self.lu = lu;
        self.replaced = replaced;
        self.ready = true;
        Ok(())
    }

    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), TracerError> {
        if !self.ready {
            return Err(TracerError::Logic("ILU(0) applied before setup".into()));
        }
        if r.len() != self.n || z.len() != self.n {
            return Err(TracerError::DimensionMismatch(format!(
                "ILU(0) of dimension {} applied to vectors of length {} and {}",
                self.n,
                r.len(),
                z.len()
            )));
        }
        z.copy_from_slice(r);
        // solve L y = r
        for i in 0..self.n {
            let mut s = z[i];
            for k in self.row_ptr[i]..self.lower_end[i] {
                s = s - self.lu[k] * z[self.col_idx[k]];
            }
            z[i] = s;
        }
        // solve U z = y
        for i in (0..self.n).rev() {
            let mut s = z[i];
            for k in self.upper_start[i]..self.row_ptr[i + 1] {
                s = s - self.lu[k] * z[self.col_idx[k]];
            }
            z[i] = s / self.pivot[i];
        }
        Ok(())
    }
}
