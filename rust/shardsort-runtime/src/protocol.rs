//! The distribute / sort / collect / merge protocol.
//!
//! Rank 0 (the coordinator) owns the dataset. It slices the dataset
//! according to a [`PartitionPlan`], ships each other rank its slice,
//! sorts its own slice, collects the sorted slices back into place in rank
//! order, and folds the sorted runs into one globally sorted array.
//! Workers are stateless and symmetric: receive one buffer, sort it, send
//! it back. A worker never learns the plan, the dataset length, or any
//! peer's partition.
//!
//! All communication is blocking and point-to-point; the coordinator's
//! receive loop imposes rank order on collection, so no cross-pair
//! ordering is ever assumed.

use thiserror::Error;

use crate::group::{GroupContext, GroupError, ProcessGroup, Rank};
use crate::transport::TransportError;
use shardsort_core::merge;
use shardsort_core::plan::{PartitionPlan, PlanError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error for a whole protocol run.
///
/// Every variant is terminal: the final array needs every rank's
/// contribution, so there is no per-rank recovery and a partial result is
/// never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The running group's size differs from the plan's worker count.
    #[error("group has {actual} members but the plan needs {expected}")]
    GroupSizeMismatch { expected: usize, actual: usize },
    /// The partition plan could not be formed.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// A send or receive failed.
    #[error("communication failure: {0}")]
    Transport(#[from] TransportError),
    /// A worker rank panicked instead of completing its partition.
    #[error("group member {rank} panicked before completing its partition")]
    WorkerPanicked { rank: Rank },
}

// ---------------------------------------------------------------------------
// Coordinator role
// ---------------------------------------------------------------------------

/// Run the coordinator role to completion, returning the sorted dataset.
///
/// `ctx` must belong to rank 0 and `dataset.len()` must equal
/// `plan.total()`. The dataset is the only buffer this function mutates;
/// it is threaded through by value so ownership stays auditable.
///
/// The group-size precondition is checked before anything else — on a
/// mismatch the run aborts with no partition sent and no element touched.
pub fn run_coordinator(
    ctx: &GroupContext,
    plan: &PartitionPlan,
    mut dataset: Vec<i64>,
) -> Result<Vec<i64>, ProtocolError> {
    debug_assert!(ctx.rank.is_coordinator());
    debug_assert_eq!(dataset.len(), plan.total());

    if ctx.world != plan.workers() {
        return Err(ProtocolError::GroupSizeMismatch {
            expected: plan.workers(),
            actual: ctx.world,
        });
    }

    // Ship every other rank its slice. Empty partitions are sent too, so
    // each worker observes exactly one request regardless of the split.
    for (r, part) in plan.parts().iter().enumerate().skip(1) {
        ctx.endpoint.send(Rank(r), dataset[part.range()].to_vec())?;
    }

    // Sort the coordinator's own partition through a local buffer, the
    // same path a worker's partition takes.
    let own = plan.parts()[0];
    let mut local = dataset[own.range()].to_vec();
    local.sort_unstable();
    dataset[own.range()].copy_from_slice(&local);

    // Collect sorted slices back into their original offsets, rank order.
    for (r, part) in plan.parts().iter().enumerate().skip(1) {
        let sorted = ctx.endpoint.recv(Rank(r), part.size)?;
        dataset[part.range()].copy_from_slice(&sorted);
    }

    Ok(fold_runs(plan, dataset))
}

/// Fold the plan's sorted runs into a single ascending array.
///
/// Left-fold in rank order: the accumulator is the sorted prefix
/// `[0, boundary)`; each following run is merged in through a scratch
/// buffer sized to the combined length, then written back over the prefix.
/// `w - 1` pairwise merges in total — no balanced tree, matching the
/// protocol's small-`w` assumption.
pub fn fold_runs(plan: &PartitionPlan, mut dataset: Vec<i64>) -> Vec<i64> {
    debug_assert_eq!(dataset.len(), plan.total());

    let mut boundary = plan.parts()[0].size;
    for part in plan.parts().iter().skip(1) {
        let mut scratch = vec![0; boundary + part.size];
        merge::merge(&dataset[..boundary], &dataset[part.range()], &mut scratch);
        boundary += part.size;
        dataset[..boundary].copy_from_slice(&scratch);
    }
    dataset
}

// ---------------------------------------------------------------------------
// Worker role
// ---------------------------------------------------------------------------

/// Run the worker role: one buffer in, the sorted buffer back out.
///
/// The received buffer's length *is* the worker's partition size; nothing
/// else about the run is visible to it. Once the sorted buffer is sent,
/// ownership moves back to the coordinator.
pub fn run_worker(ctx: &GroupContext) -> Result<(), ProtocolError> {
    debug_assert!(!ctx.rank.is_coordinator());

    let mut local = ctx.endpoint.recv_from(Rank::COORDINATOR)?;
    local.sort_unstable();
    ctx.endpoint.send(Rank::COORDINATOR, local)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Local bootstrap
// ---------------------------------------------------------------------------

/// Sort `dataset` across a freshly launched local group of `workers`
/// ranks.
///
/// Single-machine bootstrap of the full protocol: rank 0 runs on the
/// calling thread, every other rank on its own named thread, wired in a
/// star topology. The group is always joined before this returns, so no
/// member thread outlives the run. With `workers == 1` the coordinator
/// sorts alone and no transport activity happens at all.
pub fn run_local(dataset: Vec<i64>, workers: usize) -> Result<Vec<i64>, ProtocolError> {
    let plan = PartitionPlan::new(dataset.len(), workers)?;

    let (group, ctx) = ProcessGroup::launch(workers, |ctx: GroupContext| {
        // A worker that loses its link simply exits; the coordinator
        // observes the failure as a disconnect on its own side.
        let _ = run_worker(&ctx);
    });

    let result = run_coordinator(&ctx, &plan, dataset);

    // Close rank 0's links before joining so any member still blocked in a
    // receive unblocks with a disconnect instead of hanging the teardown.
    drop(ctx);

    let joined = group.join();
    let sorted = result?;
    joined.map_err(|err| match err {
        GroupError::MemberPanicked { rank } => ProtocolError::WorkerPanicked { rank },
    })?;
    Ok(sorted)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
