//! Per-participant grid storage.
//!
//! Each participant owns a `LocalBand` of shape `(local_rows + 2) × n`:
//! its contiguous slice of interior rows plus one ghost row above and one
//! below. Ghost rows mirror the neighboring bands' boundary rows and are
//! overwritten by the halo exchange every iteration; they are never
//! authoritative.

use crate::error::{BandsweepError, Result};

/// A participant's row band, stored as a flat row-major array.
///
/// Row 0 is the top ghost row, rows `1..=local_rows` are owned, row
/// `local_rows + 1` is the bottom ghost row.
pub struct LocalBand {
    n: usize,
    local_rows: usize,
    cells: Vec<f64>,
}

impl LocalBand {
    /// Allocate a zeroed band, failing with `Allocation` rather than
    /// aborting if the storage cannot be obtained.
    pub fn allocate(n: usize, local_rows: usize) -> Result<Self> {
        let len = local_rows
            .checked_add(2)
            .and_then(|rows| rows.checked_mul(n))
            .ok_or_else(|| BandsweepError::Allocation("band size overflows usize".into()))?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|e| BandsweepError::Allocation(format!("{len} cells: {e}")))?;
        cells.resize(len, 0.0);
        Ok(Self {
            n,
            local_rows,
            cells,
        })
    }

    /// Seed the band, ghost rows included: global boundary cells get 0.0,
    /// interior cell (ig, j) gets `1 + ig + j`.
    ///
    /// `first_global_row` is the global index of local row 1. With an
    /// uneven decomposition the bottom ghost row of the last rank lands on
    /// an unowned interior row; its seeded values then stand in for that
    /// row for the whole run, since no neighbor ever refreshes it.
    pub fn seed(&mut self, first_global_row: usize) {
        let n = self.n;
        for i in 0..self.local_rows + 2 {
            let ig = first_global_row + i - 1;
            for j in 0..n {
                let v = if ig == 0 || ig == n - 1 || j == 0 || j == n - 1 {
                    0.0
                } else {
                    1.0 + (ig + j) as f64
                };
                self.cells[i * n + j] = v;
            }
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn local_rows(&self) -> usize {
        self.local_rows
    }

    /// Local index of the top ghost row.
    pub fn top_ghost(&self) -> usize {
        0
    }

    /// Local index of the bottom ghost row.
    pub fn bottom_ghost(&self) -> usize {
        self.local_rows + 1
    }

    /// Local index of the first owned row.
    pub fn first_owned(&self) -> usize {
        1
    }

    /// Local index of the last owned row.
    pub fn last_owned(&self) -> usize {
        self.local_rows
    }

    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.cells[i * self.n + j] = v;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.cells[i * self.n..(i + 1) * self.n]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.cells[i * self.n..(i + 1) * self.n]
    }

    /// Copy row `i` into `dst`, resizing it to the row length.
    pub fn copy_row_into(&self, i: usize, dst: &mut Vec<f64>) {
        dst.clear();
        dst.extend_from_slice(self.row(i));
    }

    /// In-place relaxation along the horizontal axis over all owned cells:
    /// `A[i][j] = 0.5 * (A[i][j-1] + A[i][j+1])`.
    ///
    /// Fully local: only owned rows are read, ghost rows never. Returns the
    /// maximum absolute change, the participant's local epsilon for the
    /// iteration.
    pub fn relax_rows(&mut self) -> f64 {
        let n = self.n;
        let mut eps = 0.0f64;
        for i in 1..=self.local_rows {
            let row = &mut self.cells[i * n..(i + 1) * n];
            for j in 1..n - 1 {
                let old = row[j];
                row[j] = 0.5 * (row[j - 1] + row[j + 1]);
                eps = eps.max((old - row[j]).abs());
            }
        }
        eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_matches_reference_formula() {
        // N=6, single band owning all 4 interior rows.
        let mut band = LocalBand::allocate(6, 4).unwrap();
        band.seed(1);
        // Ghost rows coincide with the global boundary rows: all zero.
        assert!(band.row(band.top_ghost()).iter().all(|&v| v == 0.0));
        assert!(band.row(band.bottom_ghost()).iter().all(|&v| v == 0.0));
        // Interior: 1 + ig + j.
        assert_eq!(band.at(1, 1), 3.0);
        assert_eq!(band.at(2, 3), 6.0);
        assert_eq!(band.at(4, 4), 9.0);
        // Boundary columns stay zero.
        assert_eq!(band.at(2, 0), 0.0);
        assert_eq!(band.at(2, 5), 0.0);
    }

    #[test]
    fn seed_of_interior_ghost_rows() {
        // N=8, 2 ranks, 3 rows each: rank 1's band starts at global row 4,
        // its top ghost is global row 3 (interior, seeded 1+3+j).
        let mut band = LocalBand::allocate(8, 3).unwrap();
        band.seed(4);
        assert_eq!(band.at(0, 2), 6.0);
        assert_eq!(band.at(0, 0), 0.0);
        // Bottom ghost is global row 7: the bottom boundary.
        assert!(band.row(band.bottom_ghost()).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn relax_rows_two_point_average() {
        // N=5, one owned row: [0, a, b, c, 0]. In-place left-to-right:
        // a' = b/2, b' = (a' + c)/2, c' = b'/2.
        let mut band = LocalBand::allocate(5, 1).unwrap();
        band.set(1, 1, 4.0);
        band.set(1, 2, 8.0);
        band.set(1, 3, 2.0);
        let eps = band.relax_rows();
        assert_eq!(band.at(1, 1), 4.0);
        assert_eq!(band.at(1, 2), 3.0);
        assert_eq!(band.at(1, 3), 1.5);
        assert_eq!(eps, 5.0);
    }

    #[test]
    fn relax_rows_never_touches_ghosts_or_boundary() {
        let mut band = LocalBand::allocate(5, 2).unwrap();
        band.seed(1);
        let top: Vec<f64> = band.row(0).to_vec();
        let bottom: Vec<f64> = band.row(3).to_vec();
        band.relax_rows();
        assert_eq!(band.row(0), &top[..]);
        assert_eq!(band.row(3), &bottom[..]);
        assert_eq!(band.at(1, 0), 0.0);
        assert_eq!(band.at(1, 4), 0.0);
    }

    #[test]
    fn allocate_rejects_absurd_sizes() {
        assert!(LocalBand::allocate(usize::MAX, usize::MAX).is_err());
    }
}
