//! The performance monitor: trackers, classifiers and counters ticked together.

use axperf_bus::{BusCycle, ReadEvents, WriteEvents};
use tracing::{debug, trace};

use crate::bank::CounterBank;
use crate::config::{ConfigError, MonitorConfig};
use crate::counter::CounterWidth;
use crate::outstanding::{ReadTracker, WriteTracker};
use crate::read::{ReadCategory, ReadSnapshot};
use crate::regs::{Register, register_value};
use crate::trigger::{ControlRequest, TriggerController, TriggerTransition};
use crate::write::{WriteCategory, WriteSnapshot};

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// The cycle was counted (triggered at its start).
    pub counted: bool,
    /// Write category incremented, if any.
    pub write: Option<WriteCategory>,
    /// Read category incremented, if any.
    pub read: Option<ReadCategory>,
    /// No VALID asserted and nothing outstanding after the cycle.
    pub bus_idle: bool,
    pub transition: Option<TriggerTransition>,
}

/// AXI performance monitor.
///
/// One [`tick`](Self::tick) per clock. All of a cycle's effects (counters,
/// trackers, trigger state) are applied before `tick` returns.
#[derive(Debug, Clone)]
pub struct PerfMonitor {
    config: MonitorConfig,
    trigger: TriggerController,
    write_tracker: WriteTracker,
    read_tracker: ReadTracker,
    bank: CounterBank,
    cycle: u64,
}

impl PerfMonitor {
    /// Create a monitor in its reset state.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is out of range.
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            trigger: TriggerController::new(),
            write_tracker: WriteTracker::default(),
            read_tracker: ReadTracker::new(config.id_count()),
            bank: CounterBank::new(CounterWidth::new(config.counter_width)),
            cycle: 0,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub const fn bank(&self) -> &CounterBank {
        &self.bank
    }

    #[must_use]
    pub const fn trigger(&self) -> &TriggerController {
        &self.trigger
    }

    #[must_use]
    pub const fn write_tracker(&self) -> &WriteTracker {
        &self.write_tracker
    }

    #[must_use]
    pub const fn read_tracker(&self) -> &ReadTracker {
        &self.read_tracker
    }

    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.trigger.is_triggered()
    }

    /// Ticks since reset.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Advance one clock.
    pub fn tick(&mut self, bus: &BusCycle) -> TickOutcome {
        let counted = self.trigger.is_triggered();
        let write_snapshot = WriteSnapshot::new(self.write_tracker.flags(), &bus.write);
        let read_snapshot = ReadSnapshot::new(self.read_tracker.flags(), &bus.read);

        let write_events = WriteEvents::from_signals(&bus.write);
        let read_events = ReadEvents::from_signals(&bus.read);
        if write_events != WriteEvents::default() || read_events != ReadEvents::default() {
            trace!(
                cycle = self.cycle,
                write = ?write_events.iter().collect::<Vec<_>>(),
                read = ?read_events.iter().collect::<Vec<_>>(),
                "handshakes"
            );
        }

        let write_anomalies = self.write_tracker.update(&write_events);
        if write_anomalies.any() {
            debug!(cycle = self.cycle, ?write_anomalies, "write response with nothing outstanding");
        }
        let read_anomalies = self.read_tracker.update(&read_events);
        if let Some(id) = read_anomalies.orphan_last_beat {
            debug!(cycle = self.cycle, id, "read last beat with nothing outstanding");
        }

        let (write, read) = if counted {
            let width = self.bank.width();
            self.bank.tick_active();
            let write = self.bank.write_mut().record(
                width,
                &write_snapshot,
                &bus.write,
                &self.write_tracker,
            );
            let read = self.bank.read_mut().record(
                width,
                &read_snapshot,
                &bus.read,
                &self.read_tracker,
            );
            (write, read)
        } else {
            (None, None)
        };

        let bus_idle = !bus.any_valid()
            && self.write_tracker.is_drained()
            && self.read_tracker.is_drained();
        let transition = self.trigger.tick(bus_idle);
        match transition {
            Some(TriggerTransition::Cleared) => {
                self.bank.clear();
                debug!(cycle = self.cycle, triggered = self.trigger.is_triggered(), "counters cleared");
            }
            Some(TriggerTransition::Started) => debug!(cycle = self.cycle, "measurement started"),
            Some(TriggerTransition::Stopped) => debug!(
                cycle = self.cycle,
                active_time = self.bank.active_time(),
                "measurement stopped"
            ),
            None => {}
        }

        self.cycle += 1;
        TickOutcome {
            counted,
            write,
            read,
            bus_idle,
            transition,
        }
    }

    /// Latch a control request, as a control register write would.
    pub fn request(&mut self, request: ControlRequest) {
        self.trigger.request(request);
    }

    /// Decoded register write. Only the control register is writable.
    ///
    /// Returns whether the write changed anything.
    pub fn write_register(&mut self, addr: u64, data: u64, strb: u8) -> bool {
        if Register::decode(addr, self.config.register_bytes()) != Some(Register::Control) {
            trace!(addr, data, "write to read-only register ignored");
            return false;
        }
        match ControlRequest::decode(data, strb) {
            Some(request) => {
                self.trigger.request(request);
                true
            }
            None => {
                trace!(addr, strb, "control write without byte lane 0 ignored");
                false
            }
        }
    }

    /// Decoded register read. Unmapped addresses read as zero.
    #[must_use]
    pub fn read_register(&self, addr: u64) -> u64 {
        Register::decode(addr, self.config.register_bytes()).map_or(0, |reg| self.read(reg))
    }

    /// Value of a register, truncated to the data width.
    #[must_use]
    pub fn read(&self, register: Register) -> u64 {
        register_value(register, &self.bank, self.trigger.status()) & self.config.data_mask()
    }

    /// Full system reset: counters, trackers and control state.
    pub fn reset(&mut self) {
        debug!(cycle = self.cycle, "reset");
        self.trigger.reset();
        self.write_tracker.reset();
        self.read_tracker.reset();
        self.bank.clear();
        self.cycle = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::status_bits;

    fn monitor() -> PerfMonitor {
        PerfMonitor::new(MonitorConfig::default()).expect("default config is valid")
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(PerfMonitor::new(MonitorConfig::new().with_id_width(12)).is_err());
    }

    #[test]
    fn test_start_through_register() {
        let mut m = monitor();
        let control = Register::Control.address(4);
        assert!(m.write_register(control, 1, 0xf));
        assert_eq!(m.read_register(control), status_bits::START_PENDING);
        let outcome = m.tick(&BusCycle::idle());
        assert!(!outcome.counted);
        assert_eq!(outcome.transition, Some(TriggerTransition::Started));
        assert_eq!(m.read_register(control), status_bits::TRIGGERED);

        let outcome = m.tick(&BusCycle::idle());
        assert!(outcome.counted);
        assert_eq!(outcome.write, Some(WriteCategory::Idle));
        assert_eq!(outcome.read, Some(ReadCategory::Idle));
        assert_eq!(m.read(Register::ActiveTime), 1);
        assert_eq!(m.read(Register::WrIdle), 1);
        assert_eq!(m.read(Register::RdIdle), 1);
    }

    #[test]
    fn test_writes_elsewhere_ignored() {
        let mut m = monitor();
        assert!(!m.write_register(0, 1, 0xf));
        assert!(!m.write_register(Register::Control.address(4), 1, 0x2));
        assert_eq!(m.trigger().status(), 0);
    }

    #[test]
    fn test_unmapped_reads_zero() {
        let mut m = monitor();
        m.request(ControlRequest::Start);
        m.tick(&BusCycle::idle());
        m.tick(&BusCycle::idle());
        assert_eq!(m.read_register(0), 1);
        assert_eq!(m.read_register(0x80), 0);
        assert_eq!(m.read_register(u64::MAX), 0);
    }

    #[test]
    fn test_negative_bias_is_twos_complement() {
        let mut m = monitor();
        m.request(ControlRequest::Start);
        m.tick(&BusCycle::idle());

        // A partial data burst with no address: address-lag cycles
        let mut beat = BusCycle::idle();
        beat.write.w_valid = true;
        beat.write.w_ready = true;
        m.tick(&beat);
        m.tick(&BusCycle::idle());
        m.tick(&BusCycle::idle());
        assert_eq!(m.bank().write().bias(), -2);
        assert_eq!(m.read(Register::WrBias), 0xffff_fffe);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut m = monitor();
        m.request(ControlRequest::Start);
        m.tick(&BusCycle::idle());
        let mut address = BusCycle::idle();
        address.read.ar_valid = true;
        address.read.ar_ready = true;
        m.tick(&address);
        assert_eq!(m.read_tracker().total(), 1);
        m.reset();
        assert_eq!(m.read_tracker().total(), 0);
        assert!(!m.is_triggered());
        assert_eq!(m.read(Register::ActiveTime), 0);
        assert_eq!(m.cycles(), 0);
    }
}
