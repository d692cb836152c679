//! Overlapping Schwarz ILU(0) preconditioner.
//!
//! Each rank factorizes its local matrix, which holds the rows of its owned
//! and overlap cells, with ILU(0). Applying the preconditioner solves with the
//! local factors and then overwrites every non-owned entry with the value
//! computed by its owner, so that all ranks agree on the result.

use crate::error::TracerError;
use crate::matrix::CsrMatrix;
use crate::parallel::{CellOwnership, Comm};
use crate::preconditioner::{Ilu0, Preconditioner};

pub struct OverlappingIlu0<'a> {
    local: Ilu0<f64>,
    comm: &'a dyn Comm,
    ownership: &'a CellOwnership,
}

impl<'a> OverlappingIlu0<'a> {
    pub fn new(comm: &'a dyn Comm, ownership: &'a CellOwnership) -> Self {
        Self { local: Ilu0::new(), comm, ownership }
    }
}

impl Preconditioner<CsrMatrix<f64>, Vec<f64>> for OverlappingIlu0<'_> {
    fn setup(&mut self, a: &CsrMatrix<f64>) -> Result<(), TracerError> {
        if a.nrows() != self.ownership.len() {
            return Err(TracerError::DimensionMismatch(format!(
                "local matrix has {} rows, ownership describes {} cells",
                a.nrows(),
                self.ownership.len()
            )));
        }
        self.local.setup(a)
    }

    fn apply(&self, r: &Vec<f64>, z: &mut Vec<f64>) -> Result<(), TracerError> {
        self.local.apply(r, z)?;
        self.ownership.copy_owner_to_all(self.comm, z);
        Ok(())
    }
}
