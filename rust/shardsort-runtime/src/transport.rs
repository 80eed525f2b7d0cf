//! Rank-addressed blocking point-to-point transport.
//!
//! This module provides the channel layer between group members, built on
//! [`crossbeam_channel`]. Each [`Endpoint`] belongs to one rank and holds a
//! set of links keyed by peer rank. Links are reliable and FIFO per
//! (source, destination) pair, and every operation is blocking — the
//! protocol has no asynchronous overlap of communication and computation.
//!
//! A send moves ownership of the buffer to the receiving rank; the sender
//! cannot observe or reuse it afterwards. Each link direction buffers one
//! in-flight message, which is all the sorting protocol ever has
//! outstanding between a pair of ranks.

use crossbeam_channel::{self as cb};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::group::Rank;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned by rank-addressed sends and receives.
///
/// Every variant is fatal for the run it occurs in; the protocol never
/// retries a failed transfer or continues with partial data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The peer's endpoint was dropped before the operation completed.
    #[error("link to {peer} is disconnected")]
    Disconnected { peer: Rank },
    /// A buffer arrived with a different length than the receiver expected.
    #[error("{from} sent {actual} elements where {expected} were expected")]
    PayloadSize {
        from: Rank,
        expected: usize,
        actual: usize,
    },
    /// A bounded-wait receive expired before a buffer arrived.
    #[error("timed out waiting for a buffer from {peer}")]
    Timeout { peer: Rank },
    /// The endpoint holds no link to the addressed rank.
    #[error("no route to {rank}")]
    NoRoute { rank: Rank },
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Both directions of one point-to-point link.
struct Link {
    tx: cb::Sender<Vec<i64>>,
    rx: cb::Receiver<Vec<i64>>,
}

/// One rank's view of the transport: a set of point-to-point links keyed
/// by peer rank.
pub struct Endpoint {
    rank: Rank,
    links: HashMap<Rank, Link>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut peers: Vec<Rank> = self.links.keys().copied().collect();
        peers.sort();
        f.debug_struct("Endpoint")
            .field("rank", &self.rank)
            .field("peers", &peers)
            .finish()
    }
}

impl Endpoint {
    /// The rank that owns this endpoint.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Send `buf` to `dest`, blocking until the transport accepts it.
    ///
    /// Ownership of the buffer transfers to the peer. Fails if the peer's
    /// endpoint has been dropped.
    pub fn send(&self, dest: Rank, buf: Vec<i64>) -> Result<(), TransportError> {
        self.link(dest)?
            .tx
            .send(buf)
            .map_err(|_| TransportError::Disconnected { peer: dest })
    }

    /// Block until a buffer of exactly `expected` elements arrives from
    /// `src`.
    ///
    /// A buffer of any other length is a protocol violation and is
    /// reported as [`TransportError::PayloadSize`].
    pub fn recv(&self, src: Rank, expected: usize) -> Result<Vec<i64>, TransportError> {
        let buf = self
            .link(src)?
            .rx
            .recv()
            .map_err(|_| TransportError::Disconnected { peer: src })?;
        check_len(src, expected, buf)
    }

    /// Block until any buffer arrives from `src`.
    ///
    /// Used by workers, which learn their partition size from the message
    /// itself rather than from the plan.
    pub fn recv_from(&self, src: Rank) -> Result<Vec<i64>, TransportError> {
        self.link(src)?
            .rx
            .recv()
            .map_err(|_| TransportError::Disconnected { peer: src })
    }

    /// Bounded-wait variant of [`recv`](Endpoint::recv).
    ///
    /// The blocking receive is the reference behavior; this exists so a
    /// caller can turn an indefinite hang into a distinct, reportable
    /// [`TransportError::Timeout`].
    pub fn recv_timeout(
        &self,
        src: Rank,
        expected: usize,
        timeout: Duration,
    ) -> Result<Vec<i64>, TransportError> {
        match self.link(src)?.rx.recv_timeout(timeout) {
            Ok(buf) => check_len(src, expected, buf),
            Err(cb::RecvTimeoutError::Timeout) => Err(TransportError::Timeout { peer: src }),
            Err(cb::RecvTimeoutError::Disconnected) => {
                Err(TransportError::Disconnected { peer: src })
            }
        }
    }

    fn link(&self, rank: Rank) -> Result<&Link, TransportError> {
        self.links.get(&rank).ok_or(TransportError::NoRoute { rank })
    }
}

fn check_len(from: Rank, expected: usize, buf: Vec<i64>) -> Result<Vec<i64>, TransportError> {
    if buf.len() == expected {
        Ok(buf)
    } else {
        Err(TransportError::PayloadSize {
            from,
            expected,
            actual: buf.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// Build the coordinator-centered link set for a group of `world` ranks.
///
/// Returns rank 0's endpoint plus one endpoint per rank in `1..world`, in
/// rank order. Rank 0 gets a link to every other rank; each worker gets a
/// single link back to rank 0. The sorting protocol never needs
/// worker-to-worker links, so none are created.
pub fn star(world: usize) -> (Endpoint, Vec<Endpoint>) {
    let mut coordinator_links = HashMap::new();
    let mut workers = Vec::with_capacity(world.saturating_sub(1));

    for r in 1..world {
        let (to_worker_tx, to_worker_rx) = cb::bounded(1);
        let (to_coord_tx, to_coord_rx) = cb::bounded(1);

        coordinator_links.insert(
            Rank(r),
            Link {
                tx: to_worker_tx,
                rx: to_coord_rx,
            },
        );

        let mut links = HashMap::new();
        links.insert(
            Rank::COORDINATOR,
            Link {
                tx: to_coord_tx,
                rx: to_worker_rx,
            },
        );
        workers.push(Endpoint {
            rank: Rank(r),
            links,
        });
    }

    let coordinator = Endpoint {
        rank: Rank::COORDINATOR,
        links: coordinator_links,
    };
    (coordinator, workers)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
