//! The counter bank: every counter the monitor exports.

use crate::counter::{Counter, CounterWidth};
use crate::read::ReadCounters;
use crate::write::WriteCounters;

/// Owns all counters. Classifiers write through [`CounterBank::write_mut`]
/// and [`CounterBank::read_mut`]; everything else reads.
#[derive(Debug, Clone)]
pub struct CounterBank {
    width: CounterWidth,
    active_time: Counter,
    write: WriteCounters,
    read: ReadCounters,
}

impl CounterBank {
    #[must_use]
    pub fn new(width: CounterWidth) -> Self {
        Self {
            width,
            active_time: Counter::default(),
            write: WriteCounters::default(),
            read: ReadCounters::default(),
        }
    }

    #[must_use]
    pub const fn width(&self) -> CounterWidth {
        self.width
    }

    /// Triggered cycles.
    #[must_use]
    pub const fn active_time(&self) -> u64 {
        self.active_time.get()
    }

    #[must_use]
    pub const fn write(&self) -> &WriteCounters {
        &self.write
    }

    #[must_use]
    pub const fn read(&self) -> &ReadCounters {
        &self.read
    }

    pub(crate) const fn tick_active(&mut self) {
        self.active_time.increment(self.width);
    }

    pub(crate) const fn write_mut(&mut self) -> &mut WriteCounters {
        &mut self.write
    }

    pub(crate) const fn read_mut(&mut self) -> &mut ReadCounters {
        &mut self.read
    }

    /// Zero every counter, watermark and the bias.
    pub fn clear(&mut self) {
        self.active_time.clear();
        self.write.clear();
        self.read.clear();
    }
}
