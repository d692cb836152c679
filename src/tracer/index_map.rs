use crate::grid::GridTopology;

/// Cartesian id to active cell index, sized to the cartesian extent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CartesianIndexMap {
    cart_to_active: Vec<Option<usize>>,
}

impl CartesianIndexMap {
    pub fn build(grid: &dyn GridTopology) -> Self {
        let mut cart_to_active = vec![None; grid.cartesian_size()];
        for cell in 0..grid.num_cells() {
            cart_to_active[grid.cartesian_index(cell)] = Some(cell);
        }
        Self { cart_to_active }
    }

    /// `None` for inactive or out-of-range cartesian ids.
    pub fn active(&self, cart: usize) -> Option<usize> {
        self.cart_to_active.get(cart).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.cart_to_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cart_to_active.is_empty()
    }

    pub fn num_active(&self) -> usize {
        self.cart_to_active.iter().flatten().count()
    }
}
