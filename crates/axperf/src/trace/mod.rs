//! Cycle trace format.
//!
//! A trace is a line-oriented script of bus cycles and register accesses:
//!
//! ```text
//! # four-beat write, then read back active time
//! start
//! cycle                                  # idle, start resolves
//! cycle aw=1 awlen=3 awsize=2 w=1 wstrb=0xf
//! cycle x3 w=1 wstrb=0xf
//! cycle w=1/0                            # stalled beat
//! cycle w=1 wlast=1 wstrb=0xf
//! cycle b=1
//! read 0x0
//! ```
//!
//! Handshake keys (`aw`, `w`, `b`, `ar`, `r`) take `V/R`; a bare `1` means
//! valid and ready. Everything after `#` is a comment.

mod parse;

pub use parse::{parse_trace, parse_trace_file};

use axperf_bus::BusCycle;
use axperf_core::ControlRequest;
use thiserror::Error;

/// One trace instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceCommand {
    /// Control register write (`start`, `stop`, `clear`).
    Control(ControlRequest),
    /// Raw register write.
    RegisterWrite { addr: u64, data: u64, strb: u8 },
    /// Register read, captured in the replay outcome.
    RegisterRead { addr: u64 },
    /// Full system reset.
    Reset,
    /// `repeat` consecutive identical bus cycles.
    Cycle { bus: BusCycle, repeat: u64 },
}

/// A command with its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceLine {
    /// 1-based line number.
    pub line: usize,
    pub command: TraceCommand,
}

/// Malformed trace input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct TraceError {
    pub line: usize,
    pub message: String,
}

impl TraceError {
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}
