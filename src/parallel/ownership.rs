//! Cell ownership and overlap bookkeeping for distributed runs.
//!
//! Every rank stores the cells of its own partition plus one or more layers
//! of overlap cells owned by neighbouring ranks. Interior cells are owned by
//! exactly one rank. [`CellOwnership`] records, for every rank-local cell,
//! whether it is owned here and, per neighbouring rank, which owned values
//! have to be sent and which overlap values are received when a vector is
//! made consistent.

use bitflags::bitflags;

use crate::error::TracerError;
use crate::parallel::Comm;

bitflags! {
    /// Role of a rank-local cell in the overlapping decomposition.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CellAttributes: u8 {
        /// The cell is owned by this rank.
        const OWNER   = 0b001;
        /// Overlap cell owned elsewhere; its matrix row is kept locally.
        const OVERLAP = 0b010;
        /// Ghost copy owned elsewhere; its row is not part of the local operator.
        const COPY    = 0b100;
    }
}

/// Indices exchanged with one neighbouring rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankInterface {
    /// The neighbouring rank.
    pub rank: usize,
    /// Owned local cells whose values are sent to `rank`.
    pub send: Vec<usize>,
    /// Non-owned local cells whose values are received from `rank`.
    pub recv: Vec<usize>,
}

/// Ownership/overlap descriptor of the rank-local cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellOwnership {
    attributes: Vec<CellAttributes>,
    interfaces: Vec<RankInterface>,
}

impl CellOwnership {
    /// Descriptor with the given per-cell attributes and no neighbours.
    pub fn new(attributes: Vec<CellAttributes>) -> Self {
        Self { attributes, interfaces: Vec::new() }
    }

    /// Every one of the `n` cells is owned by this rank.
    pub fn all_owned(n: usize) -> Self {
        Self::new(vec![CellAttributes::OWNER; n])
    }

    /// Register the exchange lists for a neighbouring rank.
    ///
    /// Sent cells must be owned here, received cells must not be.
    pub fn with_interface(
        mut self,
        rank: usize,
        send: Vec<usize>,
        recv: Vec<usize>,
    ) -> Result<Self, TracerError> {
        let n = self.attributes.len();
        if let Some(&bad) = send.iter().find(|&&i| i >= n || !self.attributes[i].contains(CellAttributes::OWNER)) {
            return Err(TracerError::InvalidGrid(format!(
                "cell {bad} sent to rank {rank} is not an owned local cell"
            )));
        }
        if let Some(&bad) = recv.iter().find(|&&i| i >= n || self.attributes[i].contains(CellAttributes::OWNER)) {
            return Err(TracerError::InvalidGrid(format!(
                "cell {bad} received from rank {rank} is not a non-owned local cell"
            )));
        }
        self.interfaces.push(RankInterface { rank, send, recv });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn attribute(&self, cell: usize) -> CellAttributes {
        self.attributes[cell]
    }

    pub fn is_owner(&self, cell: usize) -> bool {
        self.attributes[cell].contains(CellAttributes::OWNER)
    }

    /// Indices of the cells owned by this rank.
    pub fn owned_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.attributes
            .iter()
            .enumerate()
            .filter(|(_, a)| a.contains(CellAttributes::OWNER))
            .map(|(i, _)| i)
    }

    pub fn interfaces(&self) -> &[RankInterface] {
        &self.interfaces
    }

    /// Zero the entries of copy cells, which are not part of the local operator.
    pub fn project(&self, values: &mut [f64]) {
        assert_eq!(values.len(), self.attributes.len());
        for (v, a) in values.iter_mut().zip(&self.attributes) {
            if a.contains(CellAttributes::COPY) {
                *v = 0.0;
            }
        }
    }

    /// Overwrite every non-owned entry with the value held by its owner.
    pub fn copy_owner_to_all(&self, comm: &dyn Comm, values: &mut [f64]) {
        assert_eq!(values.len(), self.attributes.len());
        comm.exchange(&self.interfaces, values);
    }
}
