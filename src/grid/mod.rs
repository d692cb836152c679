//! Grid topology providers.
//!
//! The tracer core never walks a concrete grid type directly. It consumes a
//! [`GridTopology`] trait object exposing exactly what a cell-centered
//! finite-volume discretization needs: cell iteration, the stencil of each
//! element, centroids, the cartesian mapping and, for grids that can be
//! distributed, the ownership/overlap descriptor of the rank-local cells.

pub mod cartesian;
pub mod unstructured;

pub use cartesian::CartesianGrid;
pub use unstructured::UnstructuredGrid;

use crate::parallel::CellOwnership;

/// Degrees of freedom touched by one element of the discretization.
///
/// For a cell-centered scheme the primary dof is the element's own cell and
/// the stencil dofs are the cell itself followed by its face neighbours.
#[derive(Clone, Debug, Default)]
pub struct Stencil {
    primary: Vec<usize>,
    dofs: Vec<usize>,
}

impl Stencil {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.primary.clear();
        self.dofs.clear();
    }

    /// Register a primary dof. Primary dofs are always part of the stencil.
    pub fn push_primary(&mut self, dof: usize) {
        self.primary.push(dof);
        self.push_dof(dof);
    }

    pub fn push_dof(&mut self, dof: usize) {
        if !self.dofs.contains(&dof) {
            self.dofs.push(dof);
        }
    }

    pub fn num_primary_dof(&self) -> usize {
        self.primary.len()
    }

    pub fn num_dof(&self) -> usize {
        self.dofs.len()
    }

    /// Global index of the `i`-th primary dof.
    pub fn primary_index(&self, i: usize) -> usize {
        self.primary[i]
    }

    /// Global index of the `i`-th stencil dof.
    pub fn global_space_index(&self, i: usize) -> usize {
        self.dofs[i]
    }
}

/// Capability set of a grid consumed by the tracer core.
///
/// Cell indices are active (solver-visible) indices in `0..num_cells()`.
pub trait GridTopology {
    /// Number of active cells, i.e. the dimension of the transport system.
    fn num_cells(&self) -> usize;

    /// Number of cells of the logical cartesian grid, active or not.
    fn cartesian_size(&self) -> usize;

    /// Cartesian id of an active cell.
    fn cartesian_index(&self, cell: usize) -> usize;

    /// Cell centroid; the third coordinate is depth.
    fn centroid(&self, cell: usize) -> [f64; 3];

    /// Number of interior (codimension-0) elements to visit.
    fn num_elements(&self) -> usize {
        self.num_cells()
    }

    /// Fill `stencil` for `element`, replacing previous content.
    fn update_stencil(&self, element: usize, stencil: &mut Stencil);

    /// Ownership/overlap descriptor; `None` if the grid cannot be distributed.
    fn cell_communication(&self) -> Option<&CellOwnership> {
        None
    }
}
