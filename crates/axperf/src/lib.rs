//! axperf - AXI performance monitor model
//!
//! Classifies every cycle of an AXI write and read channel into mutually
//! exclusive categories and accumulates the counters a hardware performance
//! monitor would export. Traces of bus cycles can be replayed from files.
//!
//! # Example
//!
//! ```ignore
//! use axperf::{MonitorConfig, Replay, trace::parse_trace_file};
//!
//! let lines = parse_trace_file("burst.trace".as_ref())?;
//! let outcome = Replay::new(MonitorConfig::default())?.run(&lines);
//! outcome.report.check_orthogonality()?;
//! ```

// Re-export from sub-crates
pub use axperf_bus::{
    BusCycle, ReadEvent, ReadEvents, ReadSignals, WriteEvent, WriteEvents, WriteSignals,
    burst_bytes,
};
pub use axperf_core::{
    ConfigError, ControlRequest, CounterBank, MAX_ID_WIDTH, MonitorConfig, PerfMonitor,
    ReadCategory, Register, TickOutcome, TriggerTransition, WriteCategory, control_bits,
    status_bits,
};

pub mod metrics;
pub mod trace;

mod replay;
mod report;

pub use replay::{RegisterRead, Replay, ReplayOutcome, replay_file};
pub use report::{OrthogonalityError, Report};

use thiserror::Error;

/// Top-level errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("trace error: {0}")]
    Trace(#[from] trace::TraceError),
    #[error("counter check failed: {0}")]
    Orthogonality(#[from] OrthogonalityError),
}

pub type Result<T> = std::result::Result<T, Error>;
