//! Communication backend abstraction for the distributed sweeps.
//!
//! Provides a trait for the point-to-point stencil traffic (boundary rows,
//! per-column wavefront handoffs) and the collective reductions, plus a
//! no-op single-process implementation.
//!
//! # Ordering contract
//!
//! Messages between a fixed (sender, receiver) pair with the same tag are
//! delivered in the order they were sent. The wavefront pipeline relies on
//! this: its per-column handoffs all reuse [`TAG_WAVEFRONT`], and issue
//! order is the only thing matching a receive to its column.

use crate::error::{BandsweepError, Result};

/// Message tag. Values match the reference protocol.
pub type Tag = i32;

/// Halo phase 1: first owned row travels to the upper neighbor.
pub const TAG_HALO_UP: Tag = 0;
/// Halo phase 2: last owned row travels to the lower neighbor.
pub const TAG_HALO_DOWN: Tag = 1;
/// Per-column wavefront handoff to the lower neighbor.
pub const TAG_WAVEFRONT: Tag = 2;

/// Abstraction over inter-participant communication.
///
/// Implementations: [`SingleProcessComm`] (no-op), `ChannelComm`
/// (in-process threads over channels), `MpiComm` (via the mpi crate,
/// `distributed` feature).
pub trait Communicator: Send {
    /// This participant's rank (band index, 0 = topmost).
    fn rank(&self) -> usize;

    /// Total number of participants.
    fn num_ranks(&self) -> usize;

    /// Blocking send of one grid row.
    fn send_row(&self, to: usize, tag: Tag, row: &[f64]) -> Result<()>;

    /// Blocking receive of one grid row into `into`.
    fn recv_row(&self, from: usize, tag: Tag, into: &mut [f64]) -> Result<()>;

    /// Blocking send of a single cell value.
    fn send_value(&self, to: usize, tag: Tag, value: f64) -> Result<()>;

    /// Blocking receive of a single cell value.
    fn recv_value(&self, from: usize, tag: Tag) -> Result<f64>;

    /// Distribute `value` from `root` to every rank; returns the root's
    /// value everywhere.
    fn broadcast_usize(&self, root: usize, value: usize) -> Result<usize>;

    /// Maximum of `local` across all ranks, delivered identically (bit for
    /// bit) to every rank.
    fn all_reduce_max(&self, local: f64) -> Result<f64>;

    /// Sum of `local` across all ranks, delivered to `root` only.
    fn reduce_sum(&self, root: usize, local: f64) -> Result<Option<f64>>;

    /// Abort the whole computation on every participant. Used for fatal
    /// configuration or allocation failures, which would otherwise leave
    /// the surviving ranks deadlocked mid-protocol.
    fn abort(&self, code: i32) -> !;
}

/// No-op backend for single-participant execution.
///
/// Reductions are identities and there are no neighbors, so any
/// point-to-point call is a protocol bug.
pub struct SingleProcessComm;

impl Communicator for SingleProcessComm {
    fn rank(&self) -> usize {
        0
    }

    fn num_ranks(&self) -> usize {
        1
    }

    fn send_row(&self, to: usize, _tag: Tag, _row: &[f64]) -> Result<()> {
        Err(BandsweepError::Communication(format!(
            "single-process send to rank {to}"
        )))
    }

    fn recv_row(&self, from: usize, _tag: Tag, _into: &mut [f64]) -> Result<()> {
        Err(BandsweepError::Communication(format!(
            "single-process receive from rank {from}"
        )))
    }

    fn send_value(&self, to: usize, _tag: Tag, _value: f64) -> Result<()> {
        Err(BandsweepError::Communication(format!(
            "single-process send to rank {to}"
        )))
    }

    fn recv_value(&self, from: usize, _tag: Tag) -> Result<f64> {
        Err(BandsweepError::Communication(format!(
            "single-process receive from rank {from}"
        )))
    }

    fn broadcast_usize(&self, _root: usize, value: usize) -> Result<usize> {
        Ok(value)
    }

    fn all_reduce_max(&self, local: f64) -> Result<f64> {
        Ok(local)
    }

    fn reduce_sum(&self, _root: usize, local: f64) -> Result<Option<f64>> {
        Ok(Some(local))
    }

    fn abort(&self, code: i32) -> ! {
        std::process::exit(code)
    }
}
