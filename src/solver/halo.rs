//! Halo exchange: boundary-row synchronization between adjacent bands.
//!
//! Before each iteration's sweeps, every participant refreshes both ghost
//! rows from its row-axis neighbors in two paired transfers:
//!
//! 1. the first owned row travels to the upper neighbor while the lower
//!    neighbor's first owned row arrives in the bottom ghost row
//!    ([`TAG_HALO_UP`]);
//! 2. the last owned row travels to the lower neighbor while the upper
//!    neighbor's last owned row arrives in the top ghost row
//!    ([`TAG_HALO_DOWN`]).
//!
//! The two phases use distinct tags so they cannot be mismatched. Within a
//! phase all traffic flows in one direction along the rank order, with a
//! pure receiver at one end of the chain, so sending before receiving
//! cannot cycle into a deadlock. Edge ranks skip the missing side: their
//! outer ghost row represents a fixed boundary and is never refreshed.

use crate::band::LocalBand;
use crate::error::Result;

use super::comm::{Communicator, Tag, TAG_HALO_DOWN, TAG_HALO_UP};

/// Scratch buffer for outgoing rows, reused across iterations.
pub struct HaloBuffer(Vec<f64>);

impl HaloBuffer {
    pub fn new() -> Self {
        Self(Vec::new())
    }
}

impl Default for HaloBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Refresh both ghost rows of `band` from the physical neighbors.
pub fn exchange<C: Communicator>(
    band: &mut LocalBand,
    buf: &mut HaloBuffer,
    comm: &C,
) -> Result<()> {
    let rank = comm.rank();
    let up = (rank > 0).then(|| rank - 1);
    let down = (rank + 1 < comm.num_ranks()).then_some(rank + 1);
    let (first, last) = (band.first_owned(), band.last_owned());
    let (top, bottom) = (band.top_ghost(), band.bottom_ghost());

    // Phase 1: rows travel upward, ghosts fill downward.
    transfer(band, buf, comm, up, first, down, bottom, TAG_HALO_UP)?;
    // Phase 2: mirror.
    transfer(band, buf, comm, down, last, up, top, TAG_HALO_DOWN)
}

#[allow(clippy::too_many_arguments)]
fn transfer<C: Communicator>(
    band: &mut LocalBand,
    buf: &mut HaloBuffer,
    comm: &C,
    send_to: Option<usize>,
    send_row: usize,
    recv_from: Option<usize>,
    recv_row: usize,
    tag: Tag,
) -> Result<()> {
    if let Some(peer) = send_to {
        band.copy_row_into(send_row, &mut buf.0);
        comm.send_row(peer, tag, &buf.0)?;
    }
    if let Some(peer) = recv_from {
        comm.recv_row(peer, tag, band.row_mut(recv_row))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::comm_channel::ChannelWorld;
    use std::thread;

    /// Seed a band and then shift its owned cells by a rank-specific
    /// offset, so received ghost data is distinguishable from the seeds.
    fn perturbed_band(n: usize, local_rows: usize, rank: usize) -> LocalBand {
        let mut band = LocalBand::allocate(n, local_rows).unwrap();
        band.seed(1 + rank * local_rows);
        for i in 1..=local_rows {
            for j in 1..n - 1 {
                let v = band.at(i, j);
                band.set(i, j, v + 100.0 * (rank + 1) as f64);
            }
        }
        band
    }

    /// N=6, P=2: after the exchange, each rank's inner ghost row must equal
    /// the neighbor's outermost owned row, and the outer ghost rows must be
    /// untouched.
    #[test]
    fn ghost_rows_mirror_neighbor_boundary_rows() {
        let n = 6;
        let local_rows = 2;
        let comms = ChannelWorld::connect(2).unwrap();

        thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .enumerate()
                .map(|(rank, comm)| {
                    scope.spawn(move || {
                        let mut band = perturbed_band(n, local_rows, rank);
                        let outer_before: Vec<f64> = if rank == 0 {
                            band.row(band.top_ghost()).to_vec()
                        } else {
                            band.row(band.bottom_ghost()).to_vec()
                        };
                        let mut buf = HaloBuffer::new();
                        exchange(&mut band, &mut buf, &comm).unwrap();
                        (band, outer_before)
                    })
                })
                .collect();
            let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            let (band0, outer0) = &results[0];
            let (band1, outer1) = &results[1];

            // Rank 0's bottom ghost carries rank 1's first owned row and
            // vice versa, including the +200/+100 perturbations.
            assert_eq!(band0.row(band0.bottom_ghost()), band1.row(1));
            assert_eq!(band1.row(band1.top_ghost()), band0.row(2));
            // Outer ghosts (fixed boundaries) were never written.
            assert_eq!(band0.row(band0.top_ghost()), &outer0[..]);
            assert_eq!(band1.row(band1.bottom_ghost()), &outer1[..]);
        });
    }

    /// P=3 exercises a rank with neighbors on both sides.
    #[test]
    fn middle_rank_refreshes_both_ghosts() {
        let n = 8;
        let local_rows = 2;
        let comms = ChannelWorld::connect(3).unwrap();

        thread::scope(|scope| {
            let handles: Vec<_> = comms
                .into_iter()
                .enumerate()
                .map(|(rank, comm)| {
                    scope.spawn(move || {
                        let mut band = perturbed_band(n, local_rows, rank);
                        let mut buf = HaloBuffer::new();
                        exchange(&mut band, &mut buf, &comm).unwrap();
                        band
                    })
                })
                .collect();
            let bands: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            // Middle band's top ghost is rank 0's last owned row (global 2),
            // bottom ghost is rank 2's first owned row (global 5).
            assert_eq!(bands[1].row(0), bands[0].row(2));
            assert_eq!(bands[1].row(3), bands[2].row(1));
        });
    }
}
