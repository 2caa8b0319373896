//! Counter snapshots and their printed forms.

use std::fmt::Write as _;

use axperf_core::{
    PerfMonitor, ReadCategory, ReadCounters, Register, WriteCategory, WriteCounters, width_mask,
};
use console::style;
use thiserror::Error;

/// A per-channel accounting identity that did not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{channel} channel accounts for {accounted} of {active_time} active cycles")]
pub struct OrthogonalityError {
    pub channel: &'static str,
    pub accounted: u64,
    pub active_time: u64,
}

/// Owned snapshot of every counter in a monitor.
#[derive(Debug, Clone)]
pub struct Report {
    /// Ticks since reset, triggered or not.
    pub cycles: u64,
    pub triggered: bool,
    pub active_time: u64,
    pub write: WriteCounters,
    pub read: ReadCounters,
    /// Every register as the bus would read it.
    pub registers: Vec<(Register, u64)>,
    counter_mask: u64,
}

impl Report {
    #[must_use]
    pub fn from_monitor(monitor: &PerfMonitor) -> Self {
        let bank = monitor.bank();
        Self {
            cycles: monitor.cycles(),
            triggered: monitor.is_triggered(),
            active_time: bank.active_time(),
            write: bank.write().clone(),
            read: bank.read().clone(),
            registers: Register::ALL
                .iter()
                .map(|&reg| (reg, monitor.read(reg)))
                .collect(),
            counter_mask: width_mask(monitor.config().counter_width),
        }
    }

    /// Value of one register at snapshot time.
    #[must_use]
    pub fn register(&self, register: Register) -> u64 {
        self.registers
            .iter()
            .find(|(reg, _)| *reg == register)
            .map_or(0, |(_, value)| *value)
    }

    /// Verify that both channels account for every active cycle:
    ///
    /// ```text
    /// write: sum(categories) - early_beats + beats == active_time
    /// read:  sum(categories) + beats == active_time
    /// ```
    ///
    /// Both sides are compared modulo the counter width.
    ///
    /// # Errors
    ///
    /// Returns the first channel whose identity fails.
    pub fn check_orthogonality(&self) -> Result<(), OrthogonalityError> {
        let w = &self.write;
        let write = w
            .category_sum()
            .wrapping_sub(w.category(WriteCategory::EarlyBeat))
            .wrapping_add(w.beats());
        self.check_channel("write", write)?;
        let read = self.read.category_sum().wrapping_add(self.read.beats());
        self.check_channel("read", read)
    }

    fn check_channel(&self, channel: &'static str, accounted: u64) -> Result<(), OrthogonalityError> {
        let accounted = accounted & self.counter_mask;
        if accounted == self.active_time & self.counter_mask {
            Ok(())
        } else {
            Err(OrthogonalityError {
                channel,
                accounted,
                active_time: self.active_time,
            })
        }
    }

    /// Fraction of active cycles carrying a write beat.
    #[must_use]
    pub fn write_utilisation(&self) -> f64 {
        ratio(self.write.beats(), self.active_time)
    }

    /// Fraction of active cycles carrying a read beat.
    #[must_use]
    pub fn read_utilisation(&self) -> f64 {
        ratio(self.read.beats(), self.active_time)
    }

    /// Mean beats per write burst.
    #[must_use]
    pub fn write_avg_burst(&self) -> f64 {
        ratio(self.write.beats(), self.write.bursts())
    }

    /// Mean beats per read burst.
    #[must_use]
    pub fn read_avg_burst(&self) -> f64 {
        ratio(self.read.beats(), self.read.bursts())
    }

    /// Write data bytes per active cycle.
    #[must_use]
    pub fn write_bandwidth(&self) -> f64 {
        ratio(self.write.data_bytes(), self.active_time)
    }

    /// Read bytes requested per active cycle.
    #[must_use]
    pub fn read_bandwidth(&self) -> f64 {
        ratio(self.read.bytes(), self.active_time)
    }

    /// `key: value` lines, one per register plus derived figures.
    #[must_use]
    pub fn render_raw(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "cycles: {}", self.cycles);
        for (reg, value) in &self.registers {
            if *reg == Register::WrBias {
                let _ = writeln!(out, "{}: {}", reg.name(), self.write.bias());
            } else {
                let _ = writeln!(out, "{}: {value}", reg.name());
            }
        }
        for (name, value) in self.derived() {
            let _ = writeln!(out, "{name}: {value:.4}");
        }
        out
    }

    /// Single-line JSON object.
    #[must_use]
    pub fn render_json(&self) -> String {
        let registers: Vec<String> = self
            .registers
            .iter()
            .map(|(reg, value)| match reg {
                Register::WrBias => format!(r#""{}":{}"#, reg.name(), self.write.bias()),
                _ => format!(r#""{}":{value}"#, reg.name()),
            })
            .collect();
        let derived: Vec<String> = self
            .derived()
            .iter()
            .map(|(name, value)| format!(r#""{name}":{value:.4}"#))
            .collect();
        format!(
            r#"{{"cycles":{},"triggered":{},"registers":{{{}}},"derived":{{{}}}}}"#,
            self.cycles,
            self.triggered,
            registers.join(","),
            derived.join(",")
        )
    }

    pub fn print_raw(&self) {
        print!("{}", self.render_raw());
    }

    /// Human-readable breakdown with per-category shares of active time.
    pub fn print_text(&self) {
        println!(
            "{} {} active of {} cycles{}",
            style("axperf").bold(),
            style(self.active_time).cyan(),
            self.cycles,
            if self.triggered { " (still triggered)" } else { "" }
        );

        println!("\n{}", style("Write channel").bold());
        for category in WriteCategory::ALL {
            self.print_share(category.name(), self.write.category(category));
        }
        self.print_share("transfer", self.write.beats());
        println!(
            "  bursts {}  beats {}  responses {}  addr bytes {}  data bytes {}",
            self.write.bursts(),
            self.write.beats(),
            self.write.responses(),
            self.write.address_bytes(),
            self.write.data_bytes()
        );
        println!(
            "  max outstanding {}  max AWLEN {}  bias {:+}",
            self.write.max_outstanding(),
            self.write.max_burst_len(),
            self.write.bias()
        );

        println!("\n{}", style("Read channel").bold());
        for category in ReadCategory::ALL {
            self.print_share(category.name(), self.read.category(category));
        }
        self.print_share("transfer", self.read.beats());
        println!(
            "  bursts {}  beats {}  bytes {}",
            self.read.bursts(),
            self.read.beats(),
            self.read.bytes()
        );
        println!(
            "  max outstanding {}  max ARLEN {}  max responding {}",
            self.read.max_outstanding(),
            self.read.max_burst_len(),
            self.read.max_responding()
        );

        println!();
        for (name, value) in self.derived() {
            println!("  {:<20} {value:.4}", style(name).dim());
        }
    }

    fn print_share(&self, name: &str, count: u64) {
        if count == 0 {
            return;
        }
        println!(
            "  {name:<20} {count:>12}  {:>6.2}%",
            ratio(count, self.active_time) * 100.0
        );
    }

    fn derived(&self) -> [(&'static str, f64); 6] {
        [
            ("wr_utilisation", self.write_utilisation()),
            ("rd_utilisation", self.read_utilisation()),
            ("wr_avg_burst", self.write_avg_burst()),
            ("rd_avg_burst", self.read_avg_burst()),
            ("wr_bytes_per_cycle", self.write_bandwidth()),
            ("rd_bytes_per_cycle", self.read_bandwidth()),
        ]
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axperf_bus::BusCycle;
    use axperf_core::{ControlRequest, MonitorConfig};

    fn idle_run(cycles: usize) -> PerfMonitor {
        let mut monitor = PerfMonitor::new(MonitorConfig::default()).expect("valid config");
        monitor.request(ControlRequest::Start);
        for _ in 0..=cycles {
            monitor.tick(&BusCycle::idle());
        }
        monitor
    }

    #[test]
    fn test_report_snapshot() {
        let report = Report::from_monitor(&idle_run(8));
        assert_eq!(report.cycles, 9);
        assert_eq!(report.active_time, 8);
        assert!(report.triggered);
        assert_eq!(report.register(Register::WrIdle), 8);
        assert_eq!(report.register(Register::RdIdle), 8);
        assert_eq!(report.registers.len(), Register::COUNT);
        assert!(report.check_orthogonality().is_ok());
        assert!(report.write_utilisation().abs() < f64::EPSILON);
    }

    #[test]
    fn test_orthogonality_failure_is_reported() {
        let mut report = Report::from_monitor(&idle_run(4));
        report.active_time = 5;
        let err = report.check_orthogonality().unwrap_err();
        assert_eq!(err.channel, "write");
        assert_eq!(err.accounted, 4);
        assert_eq!(err.active_time, 5);
    }

    #[test]
    fn test_render_raw_and_json() {
        let report = Report::from_monitor(&idle_run(3));
        let raw = report.render_raw();
        assert!(raw.starts_with("cycles: 4\n"));
        assert!(raw.contains("active_time: 3\n"));
        assert!(raw.contains("wr_bias: 0\n"));
        assert!(raw.contains("rd_utilisation: 0.0000\n"));

        let json = report.render_json();
        assert!(json.starts_with(r#"{"cycles":4,"triggered":true,"registers":{"active_time":3,"#));
        assert!(json.ends_with("}}"));
        assert!(json.contains(r#""control":1"#));
    }

    #[test]
    fn test_ratio_handles_zero() {
        assert!(ratio(5, 0).abs() < f64::EPSILON);
        assert!((ratio(1, 4) - 0.25).abs() < f64::EPSILON);
    }
}
