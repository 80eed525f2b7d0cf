//! Fixed-size process groups.
//!
//! A [`ProcessGroup`] launches one named OS thread per non-coordinator
//! rank and hands the caller back rank 0's context. The group is fixed for
//! its whole lifetime: no member joins or leaves mid-run, and every member
//! is single-threaded, communicating only through its transport endpoint.

use std::fmt;
use std::sync::Arc;
use std::thread;
use thiserror::Error;

use crate::transport::{self, Endpoint};

// ---------------------------------------------------------------------------
// Rank
// ---------------------------------------------------------------------------

/// A member's unique integer identity within its group.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub usize);

impl Rank {
    /// The rank that owns the dataset, distributes partitions, and drives
    /// the merge.
    pub const COORDINATOR: Rank = Rank(0);

    /// Return the raw numeric value.
    pub fn as_usize(self) -> usize {
        self.0
    }

    /// Whether this rank plays the coordinator role.
    pub fn is_coordinator(self) -> bool {
        self == Self::COORDINATOR
    }
}

impl fmt::Debug for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rank({})", self.0)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error produced while tearing a group down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GroupError {
    /// A member thread panicked instead of running to completion.
    #[error("group member {rank} panicked")]
    MemberPanicked { rank: Rank },
}

// ---------------------------------------------------------------------------
// GroupContext
// ---------------------------------------------------------------------------

/// Everything one member knows about its group: its own rank, the group
/// size, and its transport endpoint.
#[derive(Debug)]
pub struct GroupContext {
    /// This member's identity.
    pub rank: Rank,
    /// Total number of members in the group.
    pub world: usize,
    /// This member's rank-addressed transport endpoint.
    pub endpoint: Endpoint,
}

// ---------------------------------------------------------------------------
// ProcessGroup
// ---------------------------------------------------------------------------

/// A fixed group of `world` single-threaded members wired in a star
/// topology around rank 0.
pub struct ProcessGroup {
    handles: Vec<(Rank, thread::JoinHandle<()>)>,
    world: usize,
}

/// Resolve a requested group size: `0` means one rank per available CPU.
pub fn resolve_world(requested: usize) -> usize {
    if requested == 0 {
        num_cpus::get().max(1)
    } else {
        requested
    }
}

impl ProcessGroup {
    /// Launch a group of `world` members.
    ///
    /// Ranks `1..world` each run `member` on a dedicated thread named
    /// `shardsort-rank-{r}`; the returned context belongs to rank 0 on the
    /// calling thread. Passing `0` for `world` defaults to the number of
    /// available CPUs.
    pub fn launch<F>(world: usize, member: F) -> (Self, GroupContext)
    where
        F: Fn(GroupContext) + Send + Sync + 'static,
    {
        let world = resolve_world(world);
        let (coordinator, workers) = transport::star(world);
        let member = Arc::new(member);

        let mut handles = Vec::with_capacity(world - 1);
        for endpoint in workers {
            let rank = endpoint.rank();
            let member = Arc::clone(&member);
            let ctx = GroupContext {
                rank,
                world,
                endpoint,
            };
            let jh = thread::Builder::new()
                .name(format!("shardsort-rank-{}", rank.as_usize()))
                .spawn(move || member(ctx))
                .expect("failed to spawn group member thread");
            handles.push((rank, jh));
        }

        let ctx = GroupContext {
            rank: Rank::COORDINATOR,
            world,
            endpoint: coordinator,
        };
        (Self { handles, world }, ctx)
    }

    /// Total number of members, the coordinator included.
    pub fn world(&self) -> usize {
        self.world
    }

    /// Wait for every non-coordinator member to finish.
    ///
    /// Every thread is joined even when one of them panicked, so no member
    /// is leaked; the first panicking rank is reported.
    pub fn join(self) -> Result<(), GroupError> {
        let mut panicked = None;
        for (rank, handle) in self.handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(rank);
            }
        }
        match panicked {
            Some(rank) => Err(GroupError::MemberPanicked { rank }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessGroup")
            .field("world", &self.world)
            .field("outstanding", &self.handles.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn launch_assigns_unique_ranks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = Arc::clone(&seen);

        let (group, ctx) = ProcessGroup::launch(4, move |ctx| {
            seen2.lock().unwrap().push(ctx.rank);
        });

        assert_eq!(ctx.rank, Rank::COORDINATOR);
        assert_eq!(ctx.world, 4);
        assert_eq!(group.world(), 4);
        group.join().unwrap();

        let mut ranks = seen.lock().unwrap().clone();
        ranks.sort();
        assert_eq!(ranks, vec![Rank(1), Rank(2), Rank(3)]);
    }

    #[test]
    fn members_see_the_world_size() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = Arc::clone(&hits);

        let (group, _ctx) = ProcessGroup::launch(3, move |ctx| {
            assert_eq!(ctx.world, 3);
            hits2.fetch_add(1, Ordering::Relaxed);
        });
        group.join().unwrap();
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn single_member_group_spawns_no_threads() {
        let (group, ctx) = ProcessGroup::launch(1, |_ctx| {
            panic!("no worker rank should exist in a group of one");
        });
        assert_eq!(ctx.world, 1);
        group.join().unwrap();
    }

    #[test]
    fn zero_defaults_to_available_cpus() {
        assert!(resolve_world(0) >= 1);
        assert_eq!(resolve_world(5), 5);

        let (group, ctx) = ProcessGroup::launch(0, |_ctx| {});
        assert!(ctx.world >= 1);
        group.join().unwrap();
    }

    #[test]
    fn join_reports_a_panicked_member() {
        let (group, _ctx) = ProcessGroup::launch(3, |ctx| {
            if ctx.rank == Rank(2) {
                panic!("boom");
            }
        });
        assert_eq!(
            group.join().unwrap_err(),
            GroupError::MemberPanicked { rank: Rank(2) }
        );
    }

    #[test]
    fn rank_display_and_debug() {
        assert_eq!(Rank(3).to_string(), "rank:3");
        assert_eq!(format!("{:?}", Rank(3)), "Rank(3)");
        assert!(Rank::COORDINATOR.is_coordinator());
        assert!(!Rank(1).is_coordinator());
        assert_eq!(Rank(9).as_usize(), 9);
    }
}
