//! The per-participant iteration driver.
//!
//! Every participant runs this same sequential control flow; the only
//! coordination is the message traffic inside the halo exchange, the
//! wavefront pipeline, and the reductions. Per iteration:
//!
//! 1. halo exchange (both ghost rows refreshed),
//! 2. wavefront pipeline sweep (vertical stencil, per-column handoffs),
//! 3. local sweep along the rows (horizontal stencil, yields the local
//!    epsilon),
//! 4. max reduction of epsilon, identical on every rank.
//!
//! The loop stops once the reduced epsilon drops below the threshold or
//! the iteration cap is reached, whichever comes first — on every rank
//! simultaneously, since all of them test the same reduced value.

use std::time::{Duration, Instant};

use crate::band::LocalBand;
use crate::decompose::Decomposition;
use crate::error::Result;

use super::comm::Communicator;
use super::{halo, verify, wavefront};

/// Default iteration cap, from the reference configuration.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
/// Default convergence threshold, from the reference configuration.
pub const DEFAULT_EPSILON: f64 = 0.1e-7;

/// Rank that logs progress and receives the checksum.
pub const REPORT_RANK: usize = 0;

/// Stopping rules for the relaxation loop.
#[derive(Debug, Clone, Copy)]
pub struct RelaxParams {
    pub max_iterations: usize,
    pub epsilon: f64,
}

impl Default for RelaxParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

/// What a participant knows when the run finishes.
#[derive(Debug, Clone)]
pub struct RelaxOutcome {
    /// Iterations actually performed.
    pub iterations: usize,
    /// Last reduced epsilon; identical on every rank.
    pub global_epsilon: f64,
    /// Wall time spent in the iteration loop.
    pub elapsed: Duration,
    /// Global checksum; `Some` on [`REPORT_RANK`] only.
    pub checksum: Option<f64>,
}

/// Run the full relaxation on this participant.
///
/// `n` is read on [`REPORT_RANK`] and distributed to everyone else before
/// any storage is allocated; other ranks' `n` arguments are ignored.
pub fn run<C: Communicator>(comm: &C, n: usize, params: &RelaxParams) -> Result<RelaxOutcome> {
    let rank = comm.rank();
    let n = comm.broadcast_usize(REPORT_RANK, n)?;

    let decomp = Decomposition::new(n, comm.num_ranks())?;
    if decomp.remainder() != 0 && rank == REPORT_RANK {
        tracing::warn!(
            n,
            participants = decomp.num_ranks(),
            dropped_rows = decomp.remainder(),
            "interior rows do not divide evenly; leftover rows are excluded from the computation"
        );
    }

    let first_global_row = decomp.first_global_row(rank);
    let mut band = LocalBand::allocate(n, decomp.local_rows())?;
    band.seed(first_global_row);
    let mut buf = halo::HaloBuffer::new();

    let _span = tracing::debug_span!("relax", rank, n).entered();
    let start = Instant::now();

    let mut iterations = 0;
    let mut global_epsilon = f64::INFINITY;
    while iterations < params.max_iterations && global_epsilon >= params.epsilon {
        halo::exchange(&mut band, &mut buf, comm)?;
        wavefront::sweep(&mut band, comm)?;
        let local_epsilon = band.relax_rows();
        global_epsilon = comm.all_reduce_max(local_epsilon)?;
        iterations += 1;

        if rank == REPORT_RANK {
            tracing::info!(iteration = iterations, epsilon = global_epsilon, "sweep done");
        }
    }

    let elapsed = start.elapsed();
    let checksum = verify::checksum(&band, first_global_row, REPORT_RANK, comm)?;

    Ok(RelaxOutcome {
        iterations,
        global_epsilon,
        elapsed,
        checksum,
    })
}
