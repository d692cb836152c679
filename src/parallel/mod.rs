//! Communicators for cooperating ranks.
//!
//! A [`Comm`] is the only channel through which this crate talks to other
//! ranks: collective reductions for scalar products and point-to-point halo
//! exchange for making overlap values consistent. The trait is object safe so
//! that the tracer model can hold a `&dyn Comm` chosen at run time.

pub mod ownership;
pub use ownership::{CellAttributes, CellOwnership, RankInterface};

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;

pub trait Comm {
    fn rank(&self) -> usize;
    fn size(&self) -> usize;
    fn barrier(&self);
    /// Sum `x` over all ranks.
    fn all_reduce(&self, x: f64) -> f64;
    /// For every interface, send `values[send]` to the peer and overwrite
    /// `values[recv]` with what the peer sent back.
    fn exchange(&self, interfaces: &[RankInterface], values: &mut [f64]);
}

/// Copy between two index lists on the same rank.
fn exchange_loopback(rank: usize, interfaces: &[RankInterface], values: &mut [f64]) {
    for iface in interfaces.iter().filter(|i| i.rank == rank) {
        let outgoing: Vec<f64> = iface.send.iter().map(|&i| values[i]).collect();
        for (&i, v) in iface.recv.iter().zip(outgoing) {
            values[i] = v;
        }
    }
}

/// Single-rank communicator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Comm for SerialComm {
    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
    fn barrier(&self) {}
    fn all_reduce(&self, x: f64) -> f64 {
        x
    }
    fn exchange(&self, interfaces: &[RankInterface], values: &mut [f64]) {
        exchange_loopback(0, interfaces, values);
    }
}

/// Communicator spanning the whole job, chosen at start-up.
pub enum UniverseComm {
    #[cfg(feature = "mpi")]
    Mpi(MpiComm),
    Serial(SerialComm),
}

impl UniverseComm {
    /// MPI world when the `mpi` feature is enabled and MPI initializes,
    /// the serial communicator otherwise.
    pub fn world() -> Self {
        #[cfg(feature = "mpi")]
        {
            if let Some(comm) = MpiComm::new() {
                return UniverseComm::Mpi(comm);
            }
            log::warn!("MPI initialization failed, falling back to a serial communicator");
        }
        UniverseComm::Serial(SerialComm)
    }
}

impl Comm for UniverseComm {
    fn rank(&self) -> usize {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.rank(),
            UniverseComm::Serial(comm) => comm.rank(),
        }
    }
    fn size(&self) -> usize {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.size(),
            UniverseComm::Serial(comm) => comm.size(),
        }
    }
    fn barrier(&self) {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.barrier(),
            UniverseComm::Serial(comm) => comm.barrier(),
        }
    }
    fn all_reduce(&self, x: f64) -> f64 {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.all_reduce(x),
            UniverseComm::Serial(comm) => comm.all_reduce(x),
        }
    }
    fn exchange(&self, interfaces: &[RankInterface], values: &mut [f64]) {
        match self {
            #[cfg(feature = "mpi")]
            UniverseComm::Mpi(comm) => comm.exchange(interfaces, values),
            UniverseComm::Serial(comm) => comm.exchange(interfaces, values),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_comm_is_the_identity_reduction() {
        let comm = SerialComm;
        assert_eq!((comm.rank(), comm.size()), (0, 1));
        assert_eq!(comm.all_reduce(2.5), 2.5);
    }

    #[test]
    fn loopback_interfaces_copy_on_the_same_rank() {
        let comm = SerialComm;
        let mut v = vec![1.0, 2.0, 0.0];
        let ifaces = [
            RankInterface { rank: 0, send: vec![1], recv: vec![2] },
            RankInterface { rank: 3, send: vec![0], recv: vec![1] },
        ];
        comm.exchange(&ifaces, &mut v);
        assert_eq!(v, vec![1.0, 2.0, 2.0]);
    }

    #[cfg(not(feature = "mpi"))]
    #[test]
    fn world_without_mpi_is_serial() {
        let comm = UniverseComm::world();
        assert!(matches!(comm, UniverseComm::Serial(_)));
        assert_eq!(comm.size(), 1);
    }
}
