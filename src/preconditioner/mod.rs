//! Preconditioners for linear solvers.
//!
//! This module defines the Preconditioner trait and the two implementations
//! used for tracer transport: sequential ILU(0) and its overlapping-Schwarz
//! variant for distributed runs.

use crate::error::TracerError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r
    fn apply(&self, r: &V, z: &mut V) -> Result<(), TracerError>;
    /// Optionally: setup/factorize from A
    fn setup(&mut self, _a: &M) -> Result<(), TracerError> {
        Ok(())
    }
}

/// Identity preconditioner, used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<M, T: Copy> Preconditioner<M, Vec<T>> for Identity {
    fn apply(&self, r: &Vec<T>, z: &mut Vec<T>) -> Result<(), TracerError> {
        z.copy_from_slice(r);
        Ok(())
    }
}

pub mod asm;
pub mod ilu;

pub use asm::OverlappingIlu0;
pub use ilu::Ilu0;

pub use crate::context::pc_context::PC;
