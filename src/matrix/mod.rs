//! Matrix module: sparse CSR storage with a fixed structure, plus dense views.

pub mod dense;
pub mod sparse;
pub use sparse::{CsrBuilder, CsrMatrix, SparseMatrix};
