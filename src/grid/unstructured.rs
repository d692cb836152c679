//! Unstructured cell/face grid.
//!
//! Cells are given by their centroids and connected through interior faces.
//! This grid has no ownership descriptor and therefore only supports
//! single-rank solves.

use crate::error::TracerError;
use crate::grid::{GridTopology, Stencil};

#[derive(Clone, Debug)]
pub struct UnstructuredGrid {
    centroids: Vec<[f64; 3]>,
    neighbours: Vec<Vec<usize>>,
    cartesian: Vec<usize>,
    cartesian_size: usize,
}

impl UnstructuredGrid {
    /// Build from cell centroids and interior faces `(a, b)`.
    ///
    /// Cartesian ids default to the cell indices.
    pub fn new(centroids: Vec<[f64; 3]>, faces: &[(usize, usize)]) -> Result<Self, TracerError> {
        let n = centroids.len();
        let mut neighbours = vec![Vec::new(); n];
        for &(a, b) in faces {
            if a >= n || b >= n || a == b {
                return Err(TracerError::InvalidGrid(format!(
                    "face ({a}, {b}) does not connect two distinct cells of {n}"
                )));
            }
            if !neighbours[a].contains(&b) {
                neighbours[a].push(b);
                neighbours[b].push(a);
            }
        }
        Ok(Self {
            centroids,
            neighbours,
            cartesian: (0..n).collect(),
            cartesian_size: n,
        })
    }

    /// Place the cells in a larger logical cartesian grid.
    pub fn with_cartesian(mut self, ids: Vec<usize>, cartesian_size: usize) -> Result<Self, TracerError> {
        if ids.len() != self.centroids.len() {
            return Err(TracerError::InvalidGrid(format!(
                "{} cartesian ids for {} cells",
                ids.len(),
                self.centroids.len()
            )));
        }
        let mut seen = vec![false; cartesian_size];
        for &c in &ids {
            if c >= cartesian_size || seen[c] {
                return Err(TracerError::InvalidGrid(format!(
                    "cartesian id {c} is out of range or used twice"
                )));
            }
            seen[c] = true;
        }
        self.cartesian = ids;
        self.cartesian_size = cartesian_size;
        Ok(self)
    }
}

impl GridTopology for UnstructuredGrid {
    fn num_cells(&self) -> usize {
        self.centroids.len()
    }

    fn cartesian_size(&self) -> usize {
        self.cartesian_size
    }

    fn cartesian_index(&self, cell: usize) -> usize {
        self.cartesian[cell]
    }

    fn centroid(&self, cell: usize) -> [f64; 3] {
        self.centroids[cell]
    }

    fn update_stencil(&self, element: usize, stencil: &mut Stencil) {
        stencil.clear();
        stencil.push_primary(element);
        for &nb in &self.neighbours[element] {
            stencil.push_dof(nb);
        }
    }
}
