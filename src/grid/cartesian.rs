//! Structured cartesian grid with an optional active-cell mask.
//!
//! Cartesian ids run `i` fastest, then `j`, then `k`. Layer `k` lies at
//! depth `top + (k + 1/2) * dz`, so depth grows with `k`. Active cells are
//! numbered in cartesian order, skipping inactive ones.

use crate::error::TracerError;
use crate::grid::{GridTopology, Stencil};
use crate::parallel::CellOwnership;

#[derive(Clone, Debug)]
pub struct CartesianGrid {
    dims: [usize; 3],
    cell_size: [f64; 3],
    top: f64,
    active_to_cart: Vec<usize>,
    cart_to_active: Vec<Option<usize>>,
    ownership: Option<CellOwnership>,
}

impl CartesianGrid {
    /// Fully active `nx × ny × nz` grid with uniform cell sizes.
    pub fn new(dims: [usize; 3], cell_size: [f64; 3]) -> Result<Self, TracerError> {
        if dims.iter().any(|&d| d == 0) {
            return Err(TracerError::InvalidGrid(format!("dimensions {dims:?} must be positive")));
        }
        if cell_size.iter().any(|&h| !(h.is_finite() && h > 0.0)) {
            return Err(TracerError::InvalidGrid(format!(
                "cell sizes {cell_size:?} must be positive and finite"
            )));
        }
        let n = dims[0] * dims[1] * dims[2];
        Ok(Self {
            dims,
            cell_size,
            top: 0.0,
            active_to_cart: (0..n).collect(),
            cart_to_active: (0..n).map(Some).collect(),
            ownership: None,
        })
    }

    /// Deactivate every cartesian cell whose flag is `false`.
    pub fn with_actnum(mut self, actnum: &[bool]) -> Result<Self, TracerError> {
        if actnum.len() != self.cartesian_size() {
            return Err(TracerError::InvalidGrid(format!(
                "active-cell mask has {} entries, grid has {} cells",
                actnum.len(),
                self.cartesian_size()
            )));
        }
        self.active_to_cart = actnum
            .iter()
            .enumerate()
            .filter(|(_, a)| **a)
            .map(|(c, _)| c)
            .collect();
        self.cart_to_active = vec![None; actnum.len()];
        for (a, &c) in self.active_to_cart.iter().enumerate() {
            self.cart_to_active[c] = Some(a);
        }
        if self.ownership.as_ref().is_some_and(|o| o.len() != self.active_to_cart.len()) {
            self.ownership = None;
        }
        Ok(self)
    }

    /// Depth of the top face of layer zero.
    pub fn with_top(mut self, top: f64) -> Self {
        self.top = top;
        self
    }

    /// Attach the rank-local ownership descriptor, enabling distributed solves.
    pub fn with_ownership(mut self, ownership: CellOwnership) -> Result<Self, TracerError> {
        if ownership.len() != self.num_cells() {
            return Err(TracerError::InvalidGrid(format!(
                "ownership describes {} cells, grid has {} active cells",
                ownership.len(),
                self.num_cells()
            )));
        }
        self.ownership = Some(ownership);
        Ok(self)
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cartesian_id(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.dims[0] * (j + self.dims[1] * k)
    }

    pub fn ijk(&self, cart: usize) -> [usize; 3] {
        let [nx, ny, _] = self.dims;
        [cart % nx, (cart / nx) % ny, cart / (nx * ny)]
    }

    /// Active index of a cartesian cell, `None` when inactive.
    pub fn active_index(&self, cart: usize) -> Option<usize> {
        self.cart_to_active.get(cart).copied().flatten()
    }
}

impl GridTopology for CartesianGrid {
    fn num_cells(&self) -> usize {
        self.active_to_cart.len()
    }

    fn cartesian_size(&self) -> usize {
        self.cart_to_active.len()
    }

    fn cartesian_index(&self, cell: usize) -> usize {
        self.active_to_cart[cell]
    }

    fn centroid(&self, cell: usize) -> [f64; 3] {
        let [i, j, k] = self.ijk(self.active_to_cart[cell]);
        let [dx, dy, dz] = self.cell_size;
        [
            (i as f64 + 0.5) * dx,
            (j as f64 + 0.5) * dy,
            self.top + (k as f64 + 0.5) * dz,
        ]
    }

    fn update_stencil(&self, element: usize, stencil: &mut Stencil) {
        stencil.clear();
        stencil.push_primary(element);
        let [i, j, k] = self.ijk(self.active_to_cart[element]);
        let [nx, ny, nz] = self.dims;
        let mut visit = |ii: usize, jj: usize, kk: usize| {
            if let Some(a) = self.active_index(self.cartesian_id(ii, jj, kk)) {
                stencil.push_dof(a);
            }
        };
        if i > 0 {
            visit(i - 1, j, k);
        }
        if i + 1 < nx {
            visit(i + 1, j, k);
        }
        if j > 0 {
            visit(i, j - 1, k);
        }
        if j + 1 < ny {
            visit(i, j + 1, k);
        }
        if k > 0 {
            visit(i, j, k - 1);
        }
        if k + 1 < nz {
            visit(i, j, k + 1);
        }
    }

    fn cell_communication(&self) -> Option<&CellOwnership> {
        self.ownership.as_ref()
    }
}
