//! In-process multi-participant execution.
//!
//! Spawns one scoped OS thread per participant, each owning its
//! `ChannelComm` endpoint and running the same [`relax::run`] driver. The
//! participants live for the whole run (no pool, no task queue); they
//! interact only through their channels.

use std::thread;

use crate::error::{BandsweepError, Result};

use super::comm_channel::ChannelWorld;
use super::relax::{self, RelaxOutcome, RelaxParams};

/// Run `participants` cooperating bands and return every rank's outcome,
/// in rank order.
///
/// If any participant fails or panics the whole run fails: its channel
/// endpoints drop, each peer's next transfer errors out, and no partial
/// result is returned.
pub fn run_threaded_all(
    n: usize,
    participants: usize,
    params: &RelaxParams,
) -> Result<Vec<RelaxOutcome>> {
    let comms = ChannelWorld::connect(participants)?;

    let results: Vec<Result<RelaxOutcome>> = thread::scope(|scope| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| scope.spawn(move || relax::run(&comm, n, params)))
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join().unwrap_or_else(|_| {
                    Err(BandsweepError::Communication("participant panicked".into()))
                })
            })
            .collect()
    });

    results.into_iter().collect()
}

/// Run `participants` cooperating bands and return the reporting rank's
/// outcome (the one carrying the checksum).
pub fn run_threaded(n: usize, participants: usize, params: &RelaxParams) -> Result<RelaxOutcome> {
    let mut outcomes = run_threaded_all(n, participants, params)?;
    Ok(outcomes.swap_remove(relax::REPORT_RANK))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_participant_run() {
        let outcome = run_threaded(6, 1, &RelaxParams::default()).unwrap();
        assert!(outcome.checksum.is_some());
        assert!(outcome.iterations > 0);
    }

    #[test]
    fn all_ranks_observe_the_same_epsilon_and_iteration_count() {
        let outcomes = run_threaded_all(10, 4, &RelaxParams::default()).unwrap();
        assert_eq!(outcomes.len(), 4);
        let first = &outcomes[0];
        for o in &outcomes[1..] {
            assert_eq!(o.iterations, first.iterations);
            // Reduction result, not a tolerance comparison: bit-identical.
            assert_eq!(o.global_epsilon.to_bits(), first.global_epsilon.to_bits());
        }
    }

    #[test]
    fn only_the_reporting_rank_gets_the_checksum() {
        let outcomes = run_threaded_all(10, 2, &RelaxParams::default()).unwrap();
        assert!(outcomes[0].checksum.is_some());
        assert!(outcomes[1].checksum.is_none());
    }

    #[test]
    fn config_error_fails_every_participant() {
        // 3 participants for 2 interior rows: no valid decomposition.
        assert!(run_threaded(4, 3, &RelaxParams::default()).is_err());
    }
}
