//! Partition planning for a fixed-size rank group.
//!
//! A [`PartitionPlan`] divides `n` dataset elements across `w` ranks as
//! contiguous slices. The remainder of `n / w` is spread over the earliest
//! ranks, so no two partitions differ in size by more than one element and
//! partition sizes never increase with rank index. The plan is a pure
//! function of `(n, w)` — recomputing it anywhere yields the same layout.

use std::ops::Range;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned when a partition plan cannot be formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A plan needs at least one rank to assign elements to.
    #[error("cannot partition a dataset across zero workers")]
    NoWorkers,
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// One rank's contiguous slice of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Number of elements assigned to the rank.
    pub size: usize,
    /// Starting index of the slice in the original dataset.
    pub offset: usize,
}

impl Partition {
    /// The half-open index range this partition covers.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    /// Whether the partition holds no elements.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

// ---------------------------------------------------------------------------
// PartitionPlan
// ---------------------------------------------------------------------------

/// The full partition layout for one run: one [`Partition`] per rank, in
/// rank order, covering `[0, total)` with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    parts: Vec<Partition>,
    total: usize,
}

impl PartitionPlan {
    /// Compute the plan for `total` elements across `workers` ranks.
    ///
    /// Each rank gets `total / workers` elements; ranks below
    /// `total % workers` take one extra. Offsets are the prefix sums of the
    /// sizes, so the slices tile the dataset exactly. The only failure is
    /// `workers == 0`.
    pub fn new(total: usize, workers: usize) -> Result<Self, PlanError> {
        if workers == 0 {
            return Err(PlanError::NoWorkers);
        }

        let base = total / workers;
        let rem = total % workers;

        let mut parts = Vec::with_capacity(workers);
        let mut offset = 0;
        for rank in 0..workers {
            let size = base + usize::from(rank < rem);
            parts.push(Partition { size, offset });
            offset += size;
        }

        Ok(Self { parts, total })
    }

    /// Number of ranks in the plan.
    pub fn workers(&self) -> usize {
        self.parts.len()
    }

    /// Total number of elements covered by the plan.
    pub fn total(&self) -> usize {
        self.total
    }

    /// All partitions, indexed by rank.
    pub fn parts(&self) -> &[Partition] {
        &self.parts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
