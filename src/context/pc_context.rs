//! Preconditioner selection for the tracer solver.

/// Preconditioner kind.
///
/// On a single rank the kind is applied to the whole matrix. On several
/// ranks it is applied to the rank-local matrix and followed by an
/// owner-to-overlap exchange (overlapping Schwarz).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PC {
    /// No preconditioning.
    None,
    /// Incomplete LU factorization with zero fill-in (ILU(0)).
    #[default]
    Ilu0,
}
