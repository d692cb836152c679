//! Scalar products for sequential and distributed vectors.
//!
//! The unit type `()` is the sequential scalar product: a plain Euclidean dot
//! product over every entry of the vector, parallelised with Rayon when the
//! `rayon` feature is enabled.
//!
//! [`DistributedInnerProduct`] is the overlapping-Schwarz scalar product: each
//! rank only sums the entries of the cells it owns, and the partial sums are
//! combined with an all-reduce over the communicator. Overlap and copy cells
//! are duplicated on several ranks and would otherwise be counted twice.

use crate::core::traits::InnerProduct;
use crate::parallel::{CellOwnership, Comm};
use num_traits::Float;

/// Implements inner product and norm for vectors, with optional Rayon parallelism.
impl<T: Float + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &Vec<T>) -> T {
        self.dot(x, x).sqrt()
    }
}

/// Owner-masked scalar product reduced across all ranks.
pub struct DistributedInnerProduct<'a> {
    /// Communicator spanning the cooperating ranks.
    pub comm: &'a dyn Comm,
    /// Ownership of the rank-local cells.
    pub ownership: &'a CellOwnership,
}

impl<'a> DistributedInnerProduct<'a> {
    pub fn new(comm: &'a dyn Comm, ownership: &'a CellOwnership) -> Self {
        Self { comm, ownership }
    }
}

impl InnerProduct<Vec<f64>> for DistributedInnerProduct<'_> {
    type Scalar = f64;

    fn dot(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        assert_eq!(
            x.len(),
            self.ownership.len(),
            "Vector length does not match the ownership descriptor"
        );
        let local: f64 = self
            .ownership
            .owned_cells()
            .map(|i| x[i] * y[i])
            .sum();
        self.comm.all_reduce(local)
    }

    fn norm(&self, x: &Vec<f64>) -> f64 {
        self.dot(x, x).sqrt()
    }
}
