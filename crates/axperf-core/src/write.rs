//! Write-channel cycle classifier.
//!
//! Every triggered cycle lands in at most one [`WriteCategory`]. The rules
//! below are checked in order and the first match wins, so the categories
//! never overlap and sum back to elapsed cycles:
//!
//! ```text
//! sum(categories) - early_beats + beats == active_time
//! ```
//!
//! The only cycles without a category are ordinary data transfers (a W
//! handshake for a burst whose address is already known); those show up in
//! the beat counter instead.

use axperf_bus::WriteSignals;

use crate::counter::{Counter, CounterWidth, SignedCounter, Watermark};
use crate::outstanding::{WriteFlags, WriteTracker};

/// Mutually exclusive write-cycle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteCategory {
    /// Nothing outstanding and nothing asserted.
    Idle,
    /// A burst is under way with its address known, but no data this cycle.
    SlowData,
    /// Data is asserted but not accepted.
    Stall,
    /// A beat accepted before any address has been.
    EarlyBeat,
    /// Address accepted, data not started, no response pending.
    DataLag,
    /// Data under way while the address has not been accepted.
    AddressLag,
    /// Data complete and waiting on its address.
    AddressLagEarlyResponse,
    /// Address accepted with nothing else in flight.
    EarlyResponseLag,
    /// Address stalled before any data has appeared.
    EarlyAddressStall,
    /// Data stalled before any address has appeared.
    EarlyDataStall,
    /// Address and data complete, response not yet accepted.
    ResponseLag,
    /// Response asserted but not accepted.
    ResponseStall,
}

impl WriteCategory {
    pub const COUNT: usize = 12;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Idle,
        Self::SlowData,
        Self::Stall,
        Self::EarlyBeat,
        Self::DataLag,
        Self::AddressLag,
        Self::AddressLagEarlyResponse,
        Self::EarlyResponseLag,
        Self::EarlyAddressStall,
        Self::EarlyDataStall,
        Self::ResponseLag,
        Self::ResponseStall,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SlowData => "slow_data",
            Self::Stall => "stall",
            Self::EarlyBeat => "early_beat",
            Self::DataLag => "data_lag",
            Self::AddressLag => "addr_lag",
            Self::AddressLagEarlyResponse => "addr_lag_early_resp",
            Self::EarlyResponseLag => "early_resp_lag",
            Self::EarlyAddressStall => "early_addr_stall",
            Self::EarlyDataStall => "early_data_stall",
            Self::ResponseLag => "resp_lag",
            Self::ResponseStall => "resp_stall",
        }
    }
}

/// The nine signals the write classifier looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSnapshot {
    pub aw_outstanding: bool,
    pub w_outstanding: bool,
    pub in_progress: bool,
    pub aw_valid: bool,
    pub aw_ready: bool,
    pub w_valid: bool,
    pub w_ready: bool,
    pub b_valid: bool,
    pub b_ready: bool,
}

impl WriteSnapshot {
    /// Combine registered tracker state with this cycle's signals.
    #[must_use]
    pub const fn new(flags: WriteFlags, signals: &WriteSignals) -> Self {
        Self {
            aw_outstanding: flags.aw_outstanding,
            w_outstanding: flags.w_outstanding,
            in_progress: flags.in_progress,
            aw_valid: signals.aw_valid,
            aw_ready: signals.aw_ready,
            w_valid: signals.w_valid,
            w_ready: signals.w_ready,
            b_valid: signals.b_valid,
            b_ready: signals.b_ready,
        }
    }

    const fn w_fire(&self) -> bool {
        self.w_valid && self.w_ready
    }

    const fn quiet(&self) -> bool {
        !self.aw_outstanding
            && !self.w_outstanding
            && !self.in_progress
            && !self.aw_valid
            && !self.w_valid
            && !self.b_valid
    }
}

struct Rule {
    matches: fn(&WriteSnapshot) -> bool,
    outcome: Option<WriteCategory>,
}

/// Priority table. Rules past the W checks may assume W is not valid; rules
/// past `SlowData` may assume no burst is in progress.
static RULES: [Rule; 13] = [
    Rule {
        matches: WriteSnapshot::quiet,
        outcome: Some(WriteCategory::Idle),
    },
    Rule {
        matches: |s| s.w_fire() && !s.aw_outstanding,
        outcome: Some(WriteCategory::EarlyBeat),
    },
    Rule {
        matches: WriteSnapshot::w_fire,
        outcome: None,
    },
    Rule {
        matches: |s| s.w_valid && !s.aw_outstanding && !s.aw_valid,
        outcome: Some(WriteCategory::EarlyDataStall),
    },
    Rule {
        matches: |s| s.w_valid,
        outcome: Some(WriteCategory::Stall),
    },
    Rule {
        matches: |s| s.b_valid && !s.b_ready,
        outcome: Some(WriteCategory::ResponseStall),
    },
    Rule {
        matches: |s| s.in_progress && !s.aw_outstanding,
        outcome: Some(WriteCategory::AddressLag),
    },
    Rule {
        matches: |s| s.in_progress,
        outcome: Some(WriteCategory::SlowData),
    },
    Rule {
        matches: |s| !s.aw_outstanding && s.w_outstanding,
        outcome: Some(WriteCategory::AddressLagEarlyResponse),
    },
    Rule {
        matches: |s| !s.aw_outstanding && s.aw_valid && !s.aw_ready,
        outcome: Some(WriteCategory::EarlyAddressStall),
    },
    Rule {
        matches: |s| !s.aw_outstanding && s.aw_valid,
        outcome: Some(WriteCategory::EarlyResponseLag),
    },
    Rule {
        matches: |s| s.w_outstanding || s.b_valid,
        outcome: Some(WriteCategory::ResponseLag),
    },
    Rule {
        matches: |s| s.aw_outstanding,
        outcome: Some(WriteCategory::DataLag),
    },
];

/// Classify one cycle. `None` means an ordinary data transfer.
#[must_use]
pub fn classify(snapshot: &WriteSnapshot) -> Option<WriteCategory> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(snapshot))
        .and_then(|rule| rule.outcome)
}

/// Write-side counters.
#[derive(Debug, Clone, Default)]
pub struct WriteCounters {
    categories: [Counter; WriteCategory::COUNT],
    bursts: Counter,
    beats: Counter,
    last_beats: Counter,
    responses: Counter,
    address_bytes: Counter,
    data_bytes: Counter,
    max_outstanding: Watermark,
    max_burst_len: Watermark,
    bias: SignedCounter,
}

impl WriteCounters {
    /// Count one triggered cycle.
    ///
    /// `tracker` must already reflect this cycle's handshakes; the watermark
    /// is taken from it.
    pub fn record(
        &mut self,
        width: CounterWidth,
        snapshot: &WriteSnapshot,
        signals: &WriteSignals,
        tracker: &WriteTracker,
    ) -> Option<WriteCategory> {
        let category = classify(snapshot);
        if let Some(category) = category {
            self.categories[category.index()].increment(width);
            match category {
                WriteCategory::DataLag => self.bias.increment(width),
                WriteCategory::AddressLag | WriteCategory::AddressLagEarlyResponse => {
                    self.bias.decrement(width);
                }
                _ => {}
            }
        }

        if signals.aw_fire() {
            self.bursts.increment(width);
            self.address_bytes.add(signals.address_bytes(), width);
            self.max_burst_len.observe(u32::from(signals.aw_len));
        }
        if signals.w_fire() {
            self.beats.increment(width);
            self.data_bytes.add(signals.strobe_bytes(), width);
            if signals.w_last {
                self.last_beats.increment(width);
            }
        }
        if signals.b_fire() {
            self.responses.increment(width);
        }
        self.max_outstanding.observe(tracker.depth());
        category
    }

    #[must_use]
    pub const fn category(&self, category: WriteCategory) -> u64 {
        self.categories[category.index()].get()
    }

    /// Sum of every category counter.
    #[must_use]
    pub fn category_sum(&self) -> u64 {
        self.categories
            .iter()
            .fold(0u64, |sum, c| sum.wrapping_add(c.get()))
    }

    /// AW handshakes.
    #[must_use]
    pub const fn bursts(&self) -> u64 {
        self.bursts.get()
    }

    /// W handshakes.
    #[must_use]
    pub const fn beats(&self) -> u64 {
        self.beats.get()
    }

    /// W handshakes with WLAST.
    #[must_use]
    pub const fn last_beats(&self) -> u64 {
        self.last_beats.get()
    }

    /// B handshakes.
    #[must_use]
    pub const fn responses(&self) -> u64 {
        self.responses.get()
    }

    /// Bytes announced by AW handshakes.
    #[must_use]
    pub const fn address_bytes(&self) -> u64 {
        self.address_bytes.get()
    }

    /// Bytes carried by W beats, counted from strobes.
    #[must_use]
    pub const fn data_bytes(&self) -> u64 {
        self.data_bytes.get()
    }

    #[must_use]
    pub const fn max_outstanding(&self) -> u32 {
        self.max_outstanding.get()
    }

    /// Largest AWLEN seen.
    #[must_use]
    pub const fn max_burst_len(&self) -> u32 {
        self.max_burst_len.get()
    }

    /// Data-lag cycles minus address-lag cycles. Positive when addresses
    /// tend to lead their data. Wraps within the counter width.
    #[must_use]
    pub const fn bias(&self) -> i64 {
        self.bias.get()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
