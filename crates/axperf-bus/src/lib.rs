//! Wire-level AXI channel snapshots.
//!
//! This crate provides pure signal types with no counting logic. The
//! per-cycle classification and bookkeeping live in `axperf-core`.
//!
//! A [`BusCycle`] is everything the monitor sees on one clock edge: the
//! write side (AW, W, B) and the read side (AR, R). Handshakes are derived
//! from valid/ready pairs into [`WriteEvents`] and [`ReadEvents`].

mod event;
mod signals;

pub use event::*;
pub use signals::*;
