//! Result verification: the weighted checksum reduction.
//!
//! After the iteration loop stops, each participant folds its owned rows
//! into a weighted partial sum, `A[ig][j] * (ig+1) * (j+1) / N²`, and a
//! single sum reduction delivers the global checksum to the reporting
//! rank. Ghost rows are excluded; boundary columns are included but
//! contribute zero.

use crate::band::LocalBand;
use crate::error::Result;

use super::comm::Communicator;

/// Weighted partial sum over the rows this participant owns.
pub fn local_checksum(band: &LocalBand, first_global_row: usize) -> f64 {
    let n = band.n();
    let norm = (n * n) as f64;
    let mut sum = 0.0;
    for i in band.first_owned()..=band.last_owned() {
        let ig = first_global_row + (i - 1);
        for j in 0..n {
            sum += band.at(i, j) * ((ig + 1) * (j + 1)) as f64 / norm;
        }
    }
    sum
}

/// Reduce the partial sums; `Some` on the reporting rank only.
pub fn checksum<C: Communicator>(
    band: &LocalBand,
    first_global_row: usize,
    root: usize,
    comm: &C,
) -> Result<Option<f64>> {
    comm.reduce_sum(root, local_checksum(band, first_global_row))
}
