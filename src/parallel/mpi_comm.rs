//! MPI-based communicator.
//!
//! This module provides an implementation of the `Comm` trait using the MPI
//! backend. Collective sums back the overlapping scalar product, and
//! point-to-point messages carry the halo exchange that makes overlap cells
//! consistent with their owners. Only available with the `mpi` feature.
//!
//! # Example
//! ```no_run
//! # #[cfg(feature = "mpi")]
//! # {
//! use tracerflow::parallel::{Comm, MpiComm};
//! let comm = MpiComm::new().expect("MPI already initialized");
//! println!("Rank: {} / {}", comm.rank(), comm.size());
//! comm.barrier();
//! # }
//! ```

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::RankInterface;

/// MPI communicator wrapper for distributed parallelism.
///
/// Keeps the universe alive for as long as the communicator is used; MPI is
/// finalized when it is dropped.
pub struct MpiComm {
    _universe: Universe,
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    /// The rank (ID) of this process within the communicator.
    pub rank: usize,
    /// The total number of processes in the communicator.
    pub size: usize,
}

impl MpiComm {
    /// Initializes MPI. Returns `None` if MPI was already initialized.
    pub fn new() -> Option<Self> {
        let universe = mpi::initialize()?;
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        Some(MpiComm { _universe: universe, world, rank, size })
    }
}

impl super::Comm for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn barrier(&self) {
        self.world.barrier();
    }

    /// Performs an all-reduce sum operation across all processes.
    fn all_reduce(&self, x: f64) -> f64 {
        use mpi::collective::SystemOperation;
        let mut y = x;
        self.world.all_reduce_into(&x, &mut y, &SystemOperation::sum());
        y
    }

    /// Pairwise blocking exchange, peers visited in ascending rank order.
    ///
    /// Of each pair the lower rank sends first, which keeps the sequence of
    /// blocking calls consistent across all ranks.
    fn exchange(&self, interfaces: &[RankInterface], values: &mut [f64]) {
        let mut ordered: Vec<&RankInterface> = interfaces.iter().collect();
        ordered.sort_by_key(|iface| iface.rank);
        for iface in ordered {
            let outgoing: Vec<f64> = iface.send.iter().map(|&i| values[i]).collect();
            let incoming = if iface.rank == self.rank {
                outgoing
            } else {
                let peer = self.world.process_at_rank(iface.rank as i32);
                if self.rank < iface.rank {
                    peer.send(&outgoing[..]);
                    peer.receive_vec::<f64>().0
                } else {
                    let (buf, _status) = peer.receive_vec::<f64>();
                    peer.send(&outgoing[..]);
                    buf
                }
            };
            debug_assert_eq!(incoming.len(), iface.recv.len());
            for (&i, v) in iface.recv.iter().zip(incoming) {
                values[i] = v;
            }
        }
    }
}
