//! Linear solver options for tracer transport.
//!
//! The defaults are the fixed tracer policy: BiCGStab to a relative residual
//! reduction of 1e-2 within 100 iterations, ILU(0) preconditioning, silent.

use crate::context::pc_context::PC;

/// Solver parameters shared by the sequential and distributed paths.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SolverOptions {
    /// Required relative residual reduction
    pub tol: f64,
    /// Iteration cap
    pub max_iters: usize,
    /// 0: silent, 1: summary per solve, 2: every half step
    pub verbosity: u8,
    /// Preconditioner kind; the distributed path uses its overlapping variant
    pub preconditioner: PC,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tol: 1e-2,
            max_iters: 100,
            verbosity: 0,
            preconditioner: PC::Ilu0,
        }
    }
}

impl SolverOptions {
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_preconditioner(mut self, pc: PC) -> Self {
        self.preconditioner = pc;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracer_policy() {
        let o = SolverOptions::default();
        assert_eq!(o.tol, 1e-2);
        assert_eq!(o.max_iters, 100);
        assert_eq!(o.verbosity, 0);
        assert_eq!(o.preconditioner, PC::Ilu0);
    }
}
