//! Wavefront pipeline: the vertical-stencil sweep across partition
//! boundaries.
//!
//! The vertical update `A[i][j] = 0.5 * (A[i-1][j] + A[i+1][j])` is an
//! in-place Gauss-Seidel recurrence down each column: a band's first owned
//! cell in column j needs the value the upper neighbor just computed for
//! that column this iteration, not the stale halo copy. The dependency
//! chain therefore crosses participants per column, and the sweep runs as
//! a pipeline: receive column j's boundary value from above, update the
//! column, forward the band's own last value for column j downward. The
//! bottom ghost cell read by the last owned row comes from this
//! iteration's halo exchange (previous-iteration data, as in the
//! reference order).
//!
//! Columns are processed in strictly increasing order on every rank; all
//! handoffs share [`TAG_WAVEFRONT`] and are matched to their column purely
//! by issue order. Edge ranks elide the missing side of the handshake
//! entirely and use their fixed outer ghost row instead. Startup and drain
//! skew is expected: rank 0 runs ahead while rank P-1 is still waiting for
//! its first columns.

use crate::band::LocalBand;
use crate::error::Result;

use super::comm::{Communicator, TAG_WAVEFRONT};

/// Run the per-column pipelined vertical sweep over all owned cells.
pub fn sweep<C: Communicator>(band: &mut LocalBand, comm: &C) -> Result<()> {
    let rank = comm.rank();
    let n = band.n();
    let up = (rank > 0).then(|| rank - 1);
    let down = (rank + 1 < comm.num_ranks()).then_some(rank + 1);
    let top = band.top_ghost();
    let last = band.last_owned();

    for j in 1..n - 1 {
        if let Some(peer) = up {
            let v = comm.recv_value(peer, TAG_WAVEFRONT)?;
            band.set(top, j, v);
        }

        for i in band.first_owned()..=last {
            let v = 0.5 * (band.at(i - 1, j) + band.at(i + 1, j));
            band.set(i, j, v);
        }

        if let Some(peer) = down {
            comm.send_value(peer, TAG_WAVEFRONT, band.at(last, j))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::comm::SingleProcessComm;
    use crate::solver::comm_channel::ChannelWorld;
    use std::thread;

    /// N=4, single band: the vertical in-place averages are directly
    /// computable. Column 1 before: ghost 0, rows [3, 4], ghost 0.
    /// Row 1: 0.5*(0+4)=2; row 2: 0.5*(2+0)=1. Column 2 mirrors with
    /// [4, 5] -> [2.5, 1.25].
    #[test]
    fn single_band_matches_closed_form() {
        let mut band = LocalBand::allocate(4, 2).unwrap();
        band.seed(1);
        sweep(&mut band, &SingleProcessComm).unwrap();

        assert_eq!(band.at(1, 1), 2.0);
        assert_eq!(band.at(2, 1), 1.0);
        assert_eq!(band.at(1, 2), 2.5);
        assert_eq!(band.at(2, 2), 1.25);
    }

    /// The same grid split over two ranks must produce the same cells as
    /// the single-band sweep: the pipeline preserves the sequential
    /// evaluation order.
    #[test]
    fn split_sweep_equals_single_band_sweep() {
        let n = 6;

        // Reference: one band owning all 4 interior rows.
        let mut reference = LocalBand::allocate(n, 4).unwrap();
        reference.seed(1);
        sweep(&mut reference, &SingleProcessComm).unwrap();

        // Distributed: two bands of 2 rows each. The bottom ghost of rank 0
        // and the top ghost of rank 1 hold seeds, which is exactly what the
        // halo exchange would deliver on the first iteration.
        let comms = ChannelWorld::connect(2).unwrap();
        let bands: Vec<LocalBand> = thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .enumerate()
                .map(|(rank, comm)| {
                    scope.spawn(move || {
                        let mut band = LocalBand::allocate(n, 2).unwrap();
                        band.seed(1 + rank * 2);
                        sweep(&mut band, &comm).unwrap();
                        band
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for j in 1..n - 1 {
            for i in 1..=2 {
                assert_eq!(bands[0].at(i, j), reference.at(i, j), "rank 0 ({i},{j})");
                assert_eq!(bands[1].at(i, j), reference.at(i + 2, j), "rank 1 ({i},{j})");
            }
        }
    }

    /// Boundary columns are never updated or forwarded.
    #[test]
    fn boundary_columns_untouched() {
        let mut band = LocalBand::allocate(5, 3).unwrap();
        band.seed(1);
        sweep(&mut band, &SingleProcessComm).unwrap();
        for i in 0..5 {
            assert_eq!(band.at(i, 0), 0.0);
            assert_eq!(band.at(i, 4), 0.0);
        }
    }
}
