//! Solver selection for tracer transport.
//!
//! This module provides the `KspContext`, which decides at solve time how a
//! tracer system is solved and builds the matching operator, scalar product
//! and preconditioner once per assembled matrix.
//!
//! # Modes
//! - **Sequential** (one rank): the matrix itself is the operator, the scalar
//!   product is the plain Euclidean one, ILU(0) is factorized on the matrix.
//! - **Distributed Schwarz** (several ranks): the operator zeroes copy rows,
//!   the scalar product only counts owned cells and is reduced across ranks,
//!   and the ILU(0) result is made consistent through the grid's ownership
//!   descriptor. Grids without such a descriptor are rejected.
//!
//! Both modes run BiCGStab with the same stopping criteria.
//!
//! # References
//! - Saad, Y. (2003). Iterative Methods for Sparse Linear Systems. SIAM.

use crate::config::SolverOptions;
use crate::context::pc_context::PC;
use crate::core::DistributedInnerProduct;
use crate::error::TracerError;
use crate::grid::GridTopology;
use crate::matrix::CsrMatrix;
use crate::parallel::Comm;
use crate::preconditioner::{Identity, Ilu0, OverlappingIlu0, Preconditioner};
use crate::solver::{BatchOutcome, BiCgStabSolver, LinearSolver, OverlappingSchwarzOperator, run_batch};
use crate::utils::convergence::SolveStats;

/// How a tracer system is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverMode {
    /// Single rank, ILU(0)-preconditioned BiCGStab.
    Sequential,
    /// Several ranks, overlapping-Schwarz ILU(0)-preconditioned BiCGStab.
    DistributedSchwarz,
}

/// Solver configuration bound to a communicator and a grid.
pub struct KspContext<'a> {
    pub options: SolverOptions,
    comm: &'a dyn Comm,
    grid: &'a dyn GridTopology,
}

enum Prepared<'a> {
    Sequential {
        a: &'a CsrMatrix<f64>,
        pc: Option<Ilu0<f64>>,
    },
    Distributed {
        op: OverlappingSchwarzOperator<'a>,
        sp: DistributedInnerProduct<'a>,
        pc: Option<OverlappingIlu0<'a>>,
    },
}

/// Operator, scalar product and preconditioner built for one matrix.
///
/// Reused across right-hand sides; solves run strictly one after another.
pub struct PreparedSolver<'a> {
    prepared: Prepared<'a>,
    solver: BiCgStabSolver<f64>,
    dim: usize,
}

impl<'a> KspContext<'a> {
    pub fn new(options: SolverOptions, comm: &'a dyn Comm, grid: &'a dyn GridTopology) -> Self {
        Self { options, comm, grid }
    }

    /// Distributed as soon as more than one rank cooperates.
    pub fn mode(&self) -> SolverMode {
        if self.comm.size() > 1 {
            SolverMode::DistributedSchwarz
        } else {
            SolverMode::Sequential
        }
    }

    /// Build the operator and factorize the preconditioner for `a`.
    pub fn prepare<'m>(&self, a: &'m CsrMatrix<f64>) -> Result<PreparedSolver<'m>, TracerError>
    where
        'a: 'm,
    {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(TracerError::DimensionMismatch(format!(
                "transport matrix must be square, got {}x{}",
                n,
                a.ncols()
            )));
        }
        let solver = BiCgStabSolver::new(self.options.tol, self.options.max_iters)
            .with_verbosity(self.options.verbosity);
        let mode = self.mode();
        log::debug!(
            "tracer solver: {mode:?} on rank {} of {}, {} rows, {:?}",
            self.comm.rank(),
            self.comm.size(),
            n,
            self.options.preconditioner
        );

        let prepared = match mode {
            SolverMode::Sequential => {
                let pc = match self.options.preconditioner {
                    PC::None => None,
                    PC::Ilu0 => {
                        let mut ilu = Ilu0::new();
                        ilu.setup(a)?;
                        Some(ilu)
                    }
                };
                Prepared::Sequential { a, pc }
            }
            SolverMode::DistributedSchwarz => {
                let grid: &'a dyn GridTopology = self.grid;
                let comm: &'a dyn Comm = self.comm;
                let ownership = grid
                    .cell_communication()
                    .ok_or(TracerError::Unsupported("grid not supported for parallel tracers"))?;
                if ownership.len() != n {
                    return Err(TracerError::DimensionMismatch(format!(
                        "local matrix has {} rows, ownership describes {} cells",
                        n,
                        ownership.len()
                    )));
                }
                let pc = match self.options.preconditioner {
                    PC::None => None,
                    PC::Ilu0 => {
                        let mut ilu = OverlappingIlu0::new(comm, ownership);
                        ilu.setup(a)?;
                        Some(ilu)
                    }
                };
                Prepared::Distributed {
                    op: OverlappingSchwarzOperator::new(a, ownership),
                    sp: DistributedInnerProduct::new(comm, ownership),
                    pc,
                }
            }
        };
        Ok(PreparedSolver { prepared, solver, dim: n })
    }

    /// Single right-hand side; `x` is zeroed first.
    pub fn solve(
        &self,
        a: &CsrMatrix<f64>,
        x: &mut Vec<f64>,
        b: &Vec<f64>,
    ) -> Result<SolveStats<f64>, TracerError> {
        self.prepare(a)?.solve(x, b)
    }

    /// Many right-hand sides against one factorization.
    pub fn solve_batch(
        &self,
        a: &CsrMatrix<f64>,
        xs: &mut [Vec<f64>],
        bs: &[Vec<f64>],
    ) -> Result<BatchOutcome, TracerError> {
        self.prepare(a)?.solve_batch(xs, bs)
    }
}

impl PreparedSolver<'_> {
    pub fn mode(&self) -> SolverMode {
        match self.prepared {
            Prepared::Sequential { .. } => SolverMode::Sequential,
            Prepared::Distributed { .. } => SolverMode::DistributedSchwarz,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Zero `x`, then solve `A x = b`.
    pub fn solve(&mut self, x: &mut Vec<f64>, b: &Vec<f64>) -> Result<SolveStats<f64>, TracerError> {
        if x.len() != self.dim || b.len() != self.dim {
            return Err(TracerError::DimensionMismatch(format!(
                "vectors of length {} and {} for a system of dimension {}",
                x.len(),
                b.len(),
                self.dim
            )));
        }
        x.iter_mut().for_each(|v| *v = 0.0);
        match &self.prepared {
            Prepared::Sequential { a, pc } => {
                let pc = pc
                    .as_ref()
                    .map(|p| p as &dyn Preconditioner<CsrMatrix<f64>, Vec<f64>>);
                self.solver.solve(*a, pc, b, x)
            }
            Prepared::Distributed { op, sp, pc } => {
                let pc: &dyn Preconditioner<CsrMatrix<f64>, Vec<f64>> = match pc {
                    Some(pc) => pc,
                    None => &Identity,
                };
                self.solver.solve_with(op, sp, pc, b, x)
            }
        }
    }

    /// Solve every `(xs[i], bs[i])` pair; never stops early.
    pub fn solve_batch(&mut self, xs: &mut [Vec<f64>], bs: &[Vec<f64>]) -> Result<BatchOutcome, TracerError> {
        let dim = self.dim;
        run_batch(dim, xs, bs, |x, b| self.solve(x, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CartesianGrid;
    use crate::parallel::SerialComm;

    #[test]
    fn single_rank_selects_sequential() {
        let grid = CartesianGrid::new([2, 1, 1], [1.0; 3]).unwrap();
        let comm = SerialComm;
        let ctx = KspContext::new(SolverOptions::default(), &comm, &grid);
        assert_eq!(ctx.mode(), SolverMode::Sequential);
        let a = CsrMatrix::identity(2);
        let prepared = ctx.prepare(&a).unwrap();
        assert_eq!(prepared.mode(), SolverMode::Sequential);
        assert_eq!(prepared.dim(), 2);
    }

    #[test]
    fn unpreconditioned_sequential_solve() {
        let grid = CartesianGrid::new([3, 1, 1], [1.0; 3]).unwrap();
        let comm = SerialComm;
        let options = SolverOptions::default().with_preconditioner(PC::None);
        let ctx = KspContext::new(options, &comm, &grid);
        let a = CsrMatrix::identity(3);
        let mut x = vec![0.0; 3];
        let stats = ctx.solve(&a, &mut x, &vec![1.0, 2.0, 3.0]).unwrap();
        assert!(stats.converged);
        assert_eq!(x, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn non_square_matrix_is_rejected() {
        let grid = CartesianGrid::new([2, 1, 1], [1.0; 3]).unwrap();
        let comm = SerialComm;
        let ctx = KspContext::new(SolverOptions::default(), &comm, &grid);
        let a = CsrMatrix::from_csr(1, 2, vec![0, 1], vec![0], vec![1.0]).unwrap();
        assert!(matches!(ctx.prepare(&a), Err(TracerError::DimensionMismatch(_))));
    }
}
