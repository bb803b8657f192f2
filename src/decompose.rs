//! Row-band domain decomposition.
//!
//! Splits the N−2 interior rows of an N×N grid into contiguous bands of
//! equal height, one per participant. Rank 0 owns the topmost band
//! (adjacent to the fixed top boundary), rank P−1 the bottommost.
//! When (N−2) is not divisible by P, the leftover interior rows are not
//! assigned to anyone; callers are expected to warn once and proceed on
//! the reduced domain.

use crate::error::{BandsweepError, Result};

/// Fixed row-wise split of an N×N grid across `num_ranks` participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decomposition {
    n: usize,
    num_ranks: usize,
    local_rows: usize,
}

impl Decomposition {
    /// Validate the configuration and compute the band height.
    ///
    /// Every participant must own at least one interior row, so
    /// `num_ranks > n - 2` is rejected rather than producing empty bands.
    pub fn new(n: usize, num_ranks: usize) -> Result<Self> {
        if n <= 2 {
            return Err(BandsweepError::Config(format!(
                "grid size must be > 2, got {n}"
            )));
        }
        if num_ranks == 0 {
            return Err(BandsweepError::Config(
                "participant count must be positive".into(),
            ));
        }
        let local_rows = (n - 2) / num_ranks;
        if local_rows == 0 {
            return Err(BandsweepError::Config(format!(
                "{num_ranks} participants for {} interior rows leaves some with none",
                n - 2
            )));
        }
        Ok(Self {
            n,
            num_ranks,
            local_rows,
        })
    }

    /// Grid side length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of participants.
    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    /// Interior rows owned by each participant.
    pub fn local_rows(&self) -> usize {
        self.local_rows
    }

    /// Global index of the first row owned by `rank`.
    pub fn first_global_row(&self, rank: usize) -> usize {
        debug_assert!(rank < self.num_ranks);
        1 + rank * self.local_rows
    }

    /// Interior rows left unassigned by the even split.
    pub fn remainder(&self) -> usize {
        (self.n - 2) % self.num_ranks
    }
}
