//! Shardsort Runtime
//!
//! Process-group bootstrap, rank-addressed blocking transport, and the
//! coordinator/worker sorting protocol.

pub mod group;
pub mod protocol;
pub mod transport;
