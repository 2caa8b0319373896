//! Counting engine of an AXI performance monitor.
//!
//! Each clock the [`PerfMonitor`] takes a [`BusCycle`](axperf_bus::BusCycle),
//! sorts the write and read channel into mutually exclusive categories, and
//! accumulates cycle, byte and burst counts in a [`CounterBank`]. A
//! start/stop/clear state machine gates counting; start and stop only take
//! effect once the bus is idle.
//!
//! ```ignore
//! use axperf_core::{ControlRequest, MonitorConfig, PerfMonitor, Register};
//! use axperf_bus::BusCycle;
//!
//! let mut monitor = PerfMonitor::new(MonitorConfig::default())?;
//! monitor.request(ControlRequest::Start);
//! monitor.tick(&BusCycle::idle());
//! monitor.tick(&BusCycle::idle());
//! assert_eq!(monitor.read(Register::ActiveTime), 1);
//! ```

mod bank;
mod config;
mod counter;
mod monitor;
mod outstanding;
mod read;
mod regs;
mod trigger;
mod write;

pub use bank::CounterBank;
pub use config::{ConfigError, MAX_ID_WIDTH, MonitorConfig, width_mask};
pub use counter::{Counter, CounterWidth, SignedCounter, Watermark};
pub use monitor::{PerfMonitor, TickOutcome};
pub use outstanding::{
    OutstandingCounter, ReadAnomalies, ReadFlags, ReadTracker, WriteAnomalies, WriteFlags,
    WriteTracker,
};
pub use read::{ReadCategory, ReadCounters, ReadSnapshot, classify as classify_read};
pub use regs::{Register, pack_max_composite, register_value};
pub use trigger::{
    ControlRequest, TriggerController, TriggerTransition, control_bits, status_bits,
};
pub use write::{WriteCategory, WriteCounters, WriteSnapshot, classify as classify_write};
