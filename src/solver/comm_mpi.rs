//! MPI communication backend.
//!
//! Requires the `distributed` feature flag and an MPI installation.
//! Implements [`Communicator`] over `mpi::traits::*` for true
//! multi-process runs under `mpirun`.
//!
//! # Usage
//!
//! The caller must initialize MPI before constructing `MpiComm`:
//!
//! ```ignore
//! let universe = mpi::initialize().expect("MPI init failed");
//! let comm = MpiComm::new();
//! ```
//!
//! Point-to-point calls use blocking standard-mode sends; every phase of
//! the stencil protocol is a one-directional chain along the rank order,
//! so each send has a matching receive already outstanding or arriving
//! without a cycle.

use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use crate::error::Result;

use super::comm::{Communicator, Tag};

/// MPI-based backend over the world communicator.
///
/// Panics if MPI has not been initialized via `mpi::initialize()`.
pub struct MpiComm;

impl MpiComm {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MpiComm {
    fn default() -> Self {
        Self::new()
    }
}

impl Communicator for MpiComm {
    fn rank(&self) -> usize {
        SimpleCommunicator::world().rank() as usize
    }

    fn num_ranks(&self) -> usize {
        SimpleCommunicator::world().size() as usize
    }

    fn send_row(&self, to: usize, tag: Tag, row: &[f64]) -> Result<()> {
        let world = SimpleCommunicator::world();
        world.process_at_rank(to as i32).send_with_tag(row, tag);
        Ok(())
    }

    fn recv_row(&self, from: usize, tag: Tag, into: &mut [f64]) -> Result<()> {
        let world = SimpleCommunicator::world();
        world
            .process_at_rank(from as i32)
            .receive_into_with_tag(into, tag);
        Ok(())
    }

    fn send_value(&self, to: usize, tag: Tag, value: f64) -> Result<()> {
        let world = SimpleCommunicator::world();
        world.process_at_rank(to as i32).send_with_tag(&value, tag);
        Ok(())
    }

    fn recv_value(&self, from: usize, tag: Tag) -> Result<f64> {
        let world = SimpleCommunicator::world();
        let (value, _status) = world
            .process_at_rank(from as i32)
            .receive_with_tag::<f64>(tag);
        Ok(value)
    }

    fn broadcast_usize(&self, root: usize, value: usize) -> Result<usize> {
        let world = SimpleCommunicator::world();
        let mut buf = value as u64;
        world.process_at_rank(root as i32).broadcast_into(&mut buf);
        Ok(buf as usize)
    }

    fn all_reduce_max(&self, local: f64) -> Result<f64> {
        let world = SimpleCommunicator::world();
        let mut global = 0.0f64;
        world.all_reduce_into(&local, &mut global, SystemOperation::max());
        Ok(global)
    }

    fn reduce_sum(&self, root: usize, local: f64) -> Result<Option<f64>> {
        let world = SimpleCommunicator::world();
        let root_process = world.process_at_rank(root as i32);
        if self.rank() == root {
            let mut global = 0.0f64;
            root_process.reduce_into_root(&local, &mut global, SystemOperation::sum());
            Ok(Some(global))
        } else {
            root_process.reduce_into(&local, SystemOperation::sum());
            Ok(None)
        }
    }

    fn abort(&self, code: i32) -> ! {
        SimpleCommunicator::world().abort(code)
    }
}
