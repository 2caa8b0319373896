//! Drive a monitor from a parsed trace.

use std::path::Path;

use axperf_core::{MonitorConfig, PerfMonitor, Register};
use tracing::{debug, info_span, trace};

use crate::Result;
use crate::report::Report;
use crate::trace::{TraceCommand, TraceLine, parse_trace_file};

/// A `read` command and what it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterRead {
    /// Trace line that issued the read.
    pub line: usize,
    pub addr: u64,
    /// Register at `addr`, if mapped.
    pub register: Option<Register>,
    pub value: u64,
}

/// Everything a replay produced.
#[derive(Debug, Clone)]
pub struct ReplayOutcome {
    pub config: MonitorConfig,
    pub reads: Vec<RegisterRead>,
    /// Final counter state.
    pub report: Report,
}

/// Replays trace commands into a [`PerfMonitor`].
#[derive(Debug, Clone)]
pub struct Replay {
    monitor: PerfMonitor,
    reads: Vec<RegisterRead>,
}

impl Replay {
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range.
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Ok(Self {
            monitor: PerfMonitor::new(config)?,
            reads: Vec::new(),
        })
    }

    #[must_use]
    pub const fn monitor(&self) -> &PerfMonitor {
        &self.monitor
    }

    /// Apply one trace command.
    pub fn apply(&mut self, line: &TraceLine) {
        match line.command {
            TraceCommand::Control(request) => {
                trace!(line = line.line, ?request, "control");
                self.monitor.request(request);
            }
            TraceCommand::RegisterWrite { addr, data, strb } => {
                if !self.monitor.write_register(addr, data, strb) {
                    debug!(line = line.line, addr, data, strb, "register write had no effect");
                }
            }
            TraceCommand::RegisterRead { addr } => {
                let register = Register::decode(addr, self.monitor.config().register_bytes());
                let value = self.monitor.read_register(addr);
                trace!(line = line.line, addr, value, "register read");
                self.reads.push(RegisterRead {
                    line: line.line,
                    addr,
                    register,
                    value,
                });
            }
            TraceCommand::Reset => self.monitor.reset(),
            TraceCommand::Cycle { bus, repeat } => {
                for _ in 0..repeat {
                    self.monitor.tick(&bus);
                }
            }
        }
    }

    /// Apply every command, then snapshot the result.
    #[must_use]
    pub fn run(mut self, lines: &[TraceLine]) -> ReplayOutcome {
        let _span = info_span!("replay", commands = lines.len()).entered();
        for line in lines {
            self.apply(line);
        }
        self.finish()
    }

    #[must_use]
    pub fn finish(self) -> ReplayOutcome {
        ReplayOutcome {
            config: *self.monitor.config(),
            report: Report::from_monitor(&self.monitor),
            reads: self.reads,
        }
    }
}

/// Parse and replay a trace file.
///
/// # Errors
///
/// Returns configuration, IO and trace parse errors.
pub fn replay_file(path: &Path, config: MonitorConfig) -> Result<ReplayOutcome> {
    let replay = Replay::new(config)?;
    let lines = parse_trace_file(path)?;
    Ok(replay.run(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::parse_trace;

    fn replay(text: &str) -> ReplayOutcome {
        let lines = parse_trace(text.as_bytes()).expect("valid trace");
        Replay::new(MonitorConfig::default())
            .expect("valid config")
            .run(&lines)
    }

    #[test]
    fn test_replay_records_reads() {
        let outcome = replay(
            "start\n\
             cycle\n\
             cycle x5\n\
             read 0x0\n\
             read 0x7c\n\
             read 0x200\n",
        );
        assert_eq!(outcome.reads.len(), 3);
        assert_eq!(outcome.reads[0].value, 5);
        assert_eq!(outcome.reads[0].register, Some(Register::ActiveTime));
        assert_eq!(outcome.reads[1].line, 5);
        assert_eq!(outcome.reads[1].value, 1);
        assert_eq!(outcome.reads[2].register, None);
        assert_eq!(outcome.reads[2].value, 0);
        assert_eq!(outcome.report.cycles, 6);
    }

    #[test]
    fn test_replay_register_writes_and_reset() {
        let outcome = replay(
            "write 0x7c 1 0x1\n\
             cycle x3\n\
             write 0x7c 0 0x0   # no lane 0, ignored\n\
             cycle\n\
             read 0x0\n\
             reset\n\
             read 0x0\n",
        );
        assert_eq!(outcome.reads[0].value, 3);
        assert_eq!(outcome.reads[1].value, 0);
        assert!(!outcome.report.triggered);
    }
}
