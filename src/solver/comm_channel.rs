//! In-process message-passing backend.
//!
//! `ChannelWorld::connect(p)` wires up one bounded channel per directed
//! rank pair and hands each participant its own `ChannelComm`. No grid
//! state is shared between participants: boundary rows and wavefront
//! values travel as messages, and the collectives are built from the same
//! point-to-point channels (gather to rank 0, fold in rank order, fan the
//! result back out). Folding in a fixed order keeps the reduced value
//! bit-identical on every rank.
//!
//! Channels are bounded with capacity 1, so a send completes as soon as
//! the previous message on that link has been consumed. The paired halo
//! transfers therefore cannot deadlock regardless of send/receive order,
//! and the wavefront pipeline self-throttles to one column in flight per
//! link.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::error::{BandsweepError, Result};

use super::comm::{Communicator, Tag};

/// Tags reserved for the collectives built on the point-to-point links.
const TAG_BCAST: Tag = 16;
const TAG_REDUCE_MAX: Tag = 17;
const TAG_REDUCE_SUM: Tag = 18;

enum Payload {
    Row(Vec<f64>),
    Value(f64),
    Count(usize),
}

struct Message {
    tag: Tag,
    payload: Payload,
}

/// Builder for a set of connected in-process participants.
pub struct ChannelWorld;

impl ChannelWorld {
    /// Create `participants` fully connected endpoints.
    ///
    /// Each endpoint is meant to be moved into its own thread; dropping
    /// one mid-protocol surfaces as a `Communication` error on every peer
    /// that next touches it, so a failed participant collapses the run
    /// instead of deadlocking it.
    pub fn connect(participants: usize) -> Result<Vec<ChannelComm>> {
        if participants == 0 {
            return Err(BandsweepError::Config(
                "participant count must be positive".into(),
            ));
        }

        let mut senders: Vec<Vec<Option<SyncSender<Message>>>> = (0..participants)
            .map(|_| (0..participants).map(|_| None).collect())
            .collect();
        let mut receivers: Vec<Vec<Option<Receiver<Message>>>> = (0..participants)
            .map(|_| (0..participants).map(|_| None).collect())
            .collect();

        for src in 0..participants {
            for dst in 0..participants {
                if src != dst {
                    let (tx, rx) = sync_channel(1);
                    senders[src][dst] = Some(tx);
                    receivers[dst][src] = Some(rx);
                }
            }
        }

        Ok(senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (to_peer, from_peer))| ChannelComm {
                rank,
                size: participants,
                to_peer,
                from_peer,
            })
            .collect())
    }
}

/// One participant's endpoint in a `ChannelWorld`.
pub struct ChannelComm {
    rank: usize,
    size: usize,
    to_peer: Vec<Option<SyncSender<Message>>>,
    from_peer: Vec<Option<Receiver<Message>>>,
}

impl ChannelComm {
    fn sender(&self, to: usize) -> Result<&SyncSender<Message>> {
        self.to_peer
            .get(to)
            .and_then(|s| s.as_ref())
            .ok_or_else(|| BandsweepError::Communication(format!("no link to rank {to}")))
    }

    fn send_message(&self, to: usize, tag: Tag, payload: Payload) -> Result<()> {
        self.sender(to)?
            .send(Message { tag, payload })
            .map_err(|_| {
                BandsweepError::Communication(format!(
                    "rank {}: send to rank {to} failed, peer is gone",
                    self.rank
                ))
            })
    }

    fn recv_message(&self, from: usize, tag: Tag) -> Result<Payload> {
        let rx = self
            .from_peer
            .get(from)
            .and_then(|r| r.as_ref())
            .ok_or_else(|| BandsweepError::Communication(format!("no link from rank {from}")))?;
        let msg = rx.recv().map_err(|_| {
            BandsweepError::Communication(format!(
                "rank {}: receive from rank {from} failed, peer is gone",
                self.rank
            ))
        })?;
        if msg.tag != tag {
            return Err(BandsweepError::Communication(format!(
                "rank {}: expected tag {tag} from rank {from}, got {}",
                self.rank, msg.tag
            )));
        }
        Ok(msg.payload)
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_ranks(&self) -> usize {
        self.size
    }

    fn send_row(&self, to: usize, tag: Tag, row: &[f64]) -> Result<()> {
        self.send_message(to, tag, Payload::Row(row.to_vec()))
    }

    fn recv_row(&self, from: usize, tag: Tag, into: &mut [f64]) -> Result<()> {
        match self.recv_message(from, tag)? {
            Payload::Row(row) if row.len() == into.len() => {
                into.copy_from_slice(&row);
                Ok(())
            }
            Payload::Row(row) => Err(BandsweepError::Communication(format!(
                "rank {}: row length mismatch from rank {from}: got {}, want {}",
                self.rank,
                row.len(),
                into.len()
            ))),
            _ => Err(BandsweepError::Communication(format!(
                "rank {}: expected a row from rank {from}",
                self.rank
            ))),
        }
    }

    fn send_value(&self, to: usize, tag: Tag, value: f64) -> Result<()> {
        self.send_message(to, tag, Payload::Value(value))
    }

    fn recv_value(&self, from: usize, tag: Tag) -> Result<f64> {
        match self.recv_message(from, tag)? {
            Payload::Value(v) => Ok(v),
            _ => Err(BandsweepError::Communication(format!(
                "rank {}: expected a value from rank {from}",
                self.rank
            ))),
        }
    }

    fn broadcast_usize(&self, root: usize, value: usize) -> Result<usize> {
        if self.size == 1 {
            return Ok(value);
        }
        if self.rank == root {
            for peer in 0..self.size {
                if peer != root {
                    self.send_message(peer, TAG_BCAST, Payload::Count(value))?;
                }
            }
            Ok(value)
        } else {
            match self.recv_message(root, TAG_BCAST)? {
                Payload::Count(v) => Ok(v),
                _ => Err(BandsweepError::Communication(format!(
                    "rank {}: expected a broadcast count from rank {root}",
                    self.rank
                ))),
            }
        }
    }

    fn all_reduce_max(&self, local: f64) -> Result<f64> {
        if self.size == 1 {
            return Ok(local);
        }
        if self.rank == 0 {
            let mut global = local;
            for peer in 1..self.size {
                match self.recv_message(peer, TAG_REDUCE_MAX)? {
                    Payload::Value(v) => global = global.max(v),
                    _ => {
                        return Err(BandsweepError::Communication(format!(
                            "rank 0: expected a reduction value from rank {peer}"
                        )))
                    }
                }
            }
            for peer in 1..self.size {
                self.send_message(peer, TAG_REDUCE_MAX, Payload::Value(global))?;
            }
            Ok(global)
        } else {
            self.send_message(0, TAG_REDUCE_MAX, Payload::Value(local))?;
            match self.recv_message(0, TAG_REDUCE_MAX)? {
                Payload::Value(v) => Ok(v),
                _ => Err(BandsweepError::Communication(format!(
                    "rank {}: expected the reduced value from rank 0",
                    self.rank
                ))),
            }
        }
    }

    fn reduce_sum(&self, root: usize, local: f64) -> Result<Option<f64>> {
        if self.size == 1 {
            return Ok(Some(local));
        }
        if self.rank == root {
            // Fold in ascending rank order so the sum is deterministic.
            let mut global = local;
            for peer in (0..self.size).filter(|&p| p != root) {
                match self.recv_message(peer, TAG_REDUCE_SUM)? {
                    Payload::Value(v) => global += v,
                    _ => {
                        return Err(BandsweepError::Communication(format!(
                            "rank {root}: expected a reduction value from rank {peer}"
                        )))
                    }
                }
            }
            Ok(Some(global))
        } else {
            self.send_message(root, TAG_REDUCE_SUM, Payload::Value(local))?;
            Ok(None)
        }
    }

    fn abort(&self, code: i32) -> ! {
        // All participants are threads of one process; taking the process
        // down is the coordinated abort.
        std::process::exit(code)
    }
}
