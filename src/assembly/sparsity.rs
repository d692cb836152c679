//! Sparsity discovery from the finite-volume stencil.
//!
//! One pass over all interior elements: every stencil dof of an element is
//! coupled to every primary dof of that element. A cell is always part of its
//! own stencil, so every row contains its diagonal.

use std::collections::BTreeSet;

use crate::grid::{GridTopology, Stencil};

/// Per-row sorted set of coupled columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparsityPattern {
    rows: Vec<BTreeSet<usize>>,
}

impl SparsityPattern {
    /// Pattern with `n` empty rows.
    pub fn new(n: usize) -> Self {
        Self { rows: vec![BTreeSet::new(); n] }
    }

    /// Couple row `i` to column `j`. Repeated insertions are harmless.
    pub fn insert(&mut self, i: usize, j: usize) {
        assert!(
            i < self.rows.len() && j < self.rows.len(),
            "dof ({i}, {j}) out of range for {} cells",
            self.rows.len()
        );
        self.rows[i].insert(j);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> &BTreeSet<usize> {
        &self.rows[i]
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        self.rows.get(i).is_some_and(|r| r.contains(&j))
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeSet::len).sum()
    }

    /// j ∈ row(i) ⇔ i ∈ row(j) for all i, j.
    pub fn is_symmetric(&self) -> bool {
        self.rows
            .iter()
            .enumerate()
            .all(|(i, row)| row.iter().all(|&j| self.rows[j].contains(&i)))
    }

    /// CSR row pointers and sorted column indices.
    pub fn to_csr(&self) -> (Vec<usize>, Vec<usize>) {
        let mut row_ptr = Vec::with_capacity(self.rows.len() + 1);
        let mut col_idx = Vec::with_capacity(self.nnz());
        row_ptr.push(0);
        for row in &self.rows {
            col_idx.extend(row.iter().copied());
            row_ptr.push(col_idx.len());
        }
        (row_ptr, col_idx)
    }
}

/// Walk every element of `grid` and collect the coupled dofs of each cell.
///
/// # Panics
/// If the grid reports a dof outside `0..grid.num_cells()`; that is a broken
/// grid implementation, not a runtime condition.
pub fn build_sparsity(grid: &dyn GridTopology) -> SparsityPattern {
    let mut pattern = SparsityPattern::new(grid.num_cells());
    let mut stencil = Stencil::new();
    for element in 0..grid.num_elements() {
        grid.update_stencil(element, &mut stencil);
        for p in 0..stencil.num_primary_dof() {
            let my_idx = stencil.primary_index(p);
            for d in 0..stencil.num_dof() {
                pattern.insert(my_idx, stencil.global_space_index(d));
            }
        }
    }
    log::debug!(
        "sparsity pattern: {} rows, {} nonzeros",
        pattern.len(),
        pattern.nnz()
    );
    pattern
}
