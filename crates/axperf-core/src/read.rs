//! Read-channel cycle classifier.
//!
//! Cycles that accept a data beat are counted as beats; every other triggered
//! cycle lands in exactly one [`ReadCategory`], so
//! `sum(categories) + beats == active_time`.

use axperf_bus::ReadSignals;

use crate::counter::{Counter, CounterWidth, Watermark};
use crate::outstanding::{ReadFlags, ReadTracker};

/// Mutually exclusive read-cycle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadCategory {
    /// Data asserted but not accepted.
    DataStall,
    /// Some identifier is part way through its burst, no beat this cycle.
    SlowLink,
    /// Bursts outstanding, none of them returning data yet.
    Lag,
    Idle,
    /// Address asserted but not accepted, nothing else outstanding.
    AddressStall,
    /// Address accepted, otherwise idle.
    AddressCycle,
}

impl ReadCategory {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::DataStall,
        Self::SlowLink,
        Self::Lag,
        Self::Idle,
        Self::AddressStall,
        Self::AddressCycle,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::DataStall => "data_stall",
            Self::SlowLink => "slow_link",
            Self::Lag => "lag",
            Self::Idle => "idle",
            Self::AddressStall => "addr_stall",
            Self::AddressCycle => "addr_cycles",
        }
    }
}

/// The signals the read classifier looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSnapshot {
    pub any_returning: bool,
    pub any_outstanding: bool,
    pub ar_valid: bool,
    pub ar_ready: bool,
    pub r_valid: bool,
    pub r_ready: bool,
}

impl ReadSnapshot {
    /// Combine registered tracker state with this cycle's signals.
    #[must_use]
    pub const fn new(flags: ReadFlags, signals: &ReadSignals) -> Self {
        Self {
            any_returning: flags.any_returning,
            any_outstanding: flags.any_outstanding,
            ar_valid: signals.ar_valid,
            ar_ready: signals.ar_ready,
            r_valid: signals.r_valid,
            r_ready: signals.r_ready,
        }
    }

    const fn r_fire(&self) -> bool {
        self.r_valid && self.r_ready
    }
}

struct Rule {
    matches: fn(&ReadSnapshot) -> bool,
    outcome: Option<ReadCategory>,
}

static RULES: [Rule; 7] = [
    Rule {
        matches: ReadSnapshot::r_fire,
        outcome: None,
    },
    Rule {
        matches: |s| s.r_valid,
        outcome: Some(ReadCategory::DataStall),
    },
    Rule {
        matches: |s| s.any_returning,
        outcome: Some(ReadCategory::SlowLink),
    },
    Rule {
        matches: |s| s.any_outstanding,
        outcome: Some(ReadCategory::Lag),
    },
    Rule {
        matches: |s| !s.ar_valid,
        outcome: Some(ReadCategory::Idle),
    },
    Rule {
        matches: |s| !s.ar_ready,
        outcome: Some(ReadCategory::AddressStall),
    },
    Rule {
        matches: |_| true,
        outcome: Some(ReadCategory::AddressCycle),
    },
];

/// Classify one cycle. `None` means a data beat was accepted.
#[must_use]
pub fn classify(snapshot: &ReadSnapshot) -> Option<ReadCategory> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(snapshot))
        .and_then(|rule| rule.outcome)
}

/// Read-side counters.
#[derive(Debug, Clone, Default)]
pub struct ReadCounters {
    categories: [Counter; ReadCategory::COUNT],
    bursts: Counter,
    beats: Counter,
    last_beats: Counter,
    bytes: Counter,
    max_outstanding: Watermark,
    max_burst_len: Watermark,
    max_responding: Watermark,
}

impl ReadCounters {
    /// Count one triggered cycle. `tracker` must already reflect this
    /// cycle's handshakes.
    pub fn record(
        &mut self,
        width: CounterWidth,
        snapshot: &ReadSnapshot,
        signals: &ReadSignals,
        tracker: &ReadTracker,
    ) -> Option<ReadCategory> {
        let category = classify(snapshot);
        if let Some(category) = category {
            self.categories[category.index()].increment(width);
        }

        if signals.ar_fire() {
            self.bursts.increment(width);
            self.bytes.add(signals.address_bytes(), width);
            self.max_burst_len.observe(u32::from(signals.ar_len));
        }
        if signals.r_fire() {
            self.beats.increment(width);
            if signals.r_last {
                self.last_beats.increment(width);
            }
        }
        self.max_outstanding.observe(tracker.total());
        self.max_responding.observe(tracker.in_flight_count());
        category
    }

    #[must_use]
    pub const fn category(&self, category: ReadCategory) -> u64 {
        self.categories[category.index()].get()
    }

    #[must_use]
    pub fn category_sum(&self) -> u64 {
        self.categories
            .iter()
            .fold(0u64, |sum, c| sum.wrapping_add(c.get()))
    }

    /// AR handshakes.
    #[must_use]
    pub const fn bursts(&self) -> u64 {
        self.bursts.get()
    }

    /// R handshakes.
    #[must_use]
    pub const fn beats(&self) -> u64 {
        self.beats.get()
    }

    /// R handshakes with RLAST.
    #[must_use]
    pub const fn last_beats(&self) -> u64 {
        self.last_beats.get()
    }

    /// Bytes requested by AR handshakes.
    #[must_use]
    pub const fn bytes(&self) -> u64 {
        self.bytes.get()
    }

    #[must_use]
    pub const fn max_outstanding(&self) -> u32 {
        self.max_outstanding.get()
    }

    /// Largest ARLEN seen.
    #[must_use]
    pub const fn max_burst_len(&self) -> u32 {
        self.max_burst_len.get()
    }

    /// Most identifiers seen in flight at once. Can be lower than
    /// [`max_outstanding`](Self::max_outstanding) when several bursts share
    /// an identifier.
    #[must_use]
    pub const fn max_responding(&self) -> u32 {
        self.max_responding.get()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_from_bits(bits: u8) -> ReadSnapshot {
        let bit = |n: u8| bits & (1 << n) != 0;
        ReadSnapshot {
            any_returning: bit(5),
            any_outstanding: bit(4),
            ar_valid: bit(3),
            ar_ready: bit(2),
            r_valid: bit(1),
            r_ready: bit(0),
        }
    }

    #[test]
    fn test_table_is_exhaustive() {
        for bits in 0..64u8 {
            let s = snapshot_from_bits(bits);
            let beat = s.r_valid && s.r_ready;
            assert_eq!(classify(&s).is_none(), beat, "snapshot {bits:06b}");
        }
    }

    #[test]
    fn test_priorities() {
        let slow = ReadSnapshot {
            any_returning: true,
            any_outstanding: true,
            ar_valid: true,
            ..Default::default()
        };
        assert_eq!(classify(&slow), Some(ReadCategory::SlowLink));

        let lag = ReadSnapshot {
            any_outstanding: true,
            ..Default::default()
        };
        assert_eq!(classify(&lag), Some(ReadCategory::Lag));

        let stall = ReadSnapshot {
            r_valid: true,
            any_returning: true,
            ..Default::default()
        };
        assert_eq!(classify(&stall), Some(ReadCategory::DataStall));

        assert_eq!(
            classify(&ReadSnapshot::default()),
            Some(ReadCategory::Idle)
        );
        let ar_stall = ReadSnapshot {
            ar_valid: true,
            ..Default::default()
        };
        assert_eq!(classify(&ar_stall), Some(ReadCategory::AddressStall));
        let ar_cycle = ReadSnapshot {
            ar_valid: true,
            ar_ready: true,
            ..Default::default()
        };
        assert_eq!(classify(&ar_cycle), Some(ReadCategory::AddressCycle));
    }

    #[test]
    fn test_record_beat_is_not_categorised() {
        let width = CounterWidth::new(32);
        let mut counters = ReadCounters::default();
        let tracker = ReadTracker::new(4);
        let signals = ReadSignals {
            r_valid: true,
            r_ready: true,
            r_last: true,
            ..Default::default()
        };
        let snapshot = ReadSnapshot::new(tracker.flags(), &signals);
        assert_eq!(counters.record(width, &snapshot, &signals, &tracker), None);
        assert_eq!(counters.beats(), 1);
        assert_eq!(counters.last_beats(), 1);
        assert_eq!(counters.category_sum(), 0);
    }
}
