//! tracerflow: passive tracer transport for cell-centered finite-volume grids
//!
//! This crate builds the sparse structure of the tracer transport system from a
//! grid stencil, owns the per-tracer concentration fields and solves the
//! assembled systems with ILU(0)-preconditioned BiCGStab, either on a single
//! rank or as an overlapping Schwarz method across cooperating ranks.

pub mod parallel;

pub mod assembly;
pub mod config;
pub mod context;
pub mod core;
pub mod error;
pub mod grid;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod tracer;
pub mod utils;

// Re-exports for convenience
pub use crate::assembly::*;
pub use crate::config::*;
pub use crate::context::*;
pub use crate::core::*;
pub use crate::error::*;
pub use crate::grid::*;
pub use crate::matrix::*;
pub use crate::parallel::*;
pub use crate::preconditioner::*;
pub use crate::solver::*;
pub use crate::tracer::*;
pub use crate::utils::*;
