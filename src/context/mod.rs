//! Solver and preconditioner selection.
//!
//! Modules:
//! - [`ksp_context`]: `KspContext`, which picks the sequential or the
//!   distributed Schwarz path and prepares it for one matrix.
//! - [`pc_context`]: the preconditioner kind.
//!
//! # Example
//! ```rust,ignore
//! use tracerflow::context::KspContext;
//! let ctx = KspContext::new(SolverOptions::default(), &comm, &grid);
//! let outcome = ctx.solve_batch(&a, &mut xs, &bs)?;
//! ```

pub mod ksp_context;
pub use ksp_context::{KspContext, PreparedSolver, SolverMode};
pub mod pc_context;
