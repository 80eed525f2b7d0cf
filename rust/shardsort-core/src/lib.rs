//! Shardsort Core
//!
//! Pure algorithms behind the shardsort protocol: partition planning,
//! pairwise merging of sorted runs, and deterministic dataset generation.
//! Nothing in this crate spawns threads or touches a channel.

pub mod dataset;
pub mod merge;
pub mod plan;
