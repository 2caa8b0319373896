//! Outstanding-burst trackers.
//!
//! Each tracker observes a burst-start and a burst-end event once per cycle:
//!
//! | start | end | effect    |
//! |-------|-----|-----------|
//! | 0     | 0   | none      |
//! | 1     | 0   | increment |
//! | 0     | 1   | decrement |
//! | 1     | 1   | none      |
//!
//! Counts never go below zero. A completion with nothing outstanding is
//! dropped and reported back to the caller.

use axperf_bus::{ReadEvents, WriteEvents};

/// Live count of bursts started but not yet completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutstandingCounter {
    count: u32,
    /// Cached `count == 0`.
    zero: bool,
}

impl OutstandingCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            zero: true,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.zero
    }

    /// Apply one cycle's events.
    ///
    /// Returns `false` if `end` fired with nothing outstanding.
    pub const fn update(&mut self, start: bool, end: bool) -> bool {
        match (start, end) {
            (true, false) => {
                self.count = self.count.saturating_add(1);
                self.zero = false;
            }
            (false, true) => {
                if self.zero {
                    return false;
                }
                // count == 1 before the decrement means zero after it
                self.zero = self.count == 1;
                self.count -= 1;
            }
            _ => {}
        }
        true
    }

    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for OutstandingCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Registered write-side state, as seen by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteFlags {
    /// Some accepted address still awaits its response.
    pub aw_outstanding: bool,
    /// Some fully delivered data burst still awaits its response.
    pub w_outstanding: bool,
    /// A data burst has started but its last beat has not been accepted.
    pub in_progress: bool,
}

/// Write-channel trackers: address bursts, data bursts, and the partial burst.
#[derive(Debug, Clone, Default)]
pub struct WriteTracker {
    address: OutstandingCounter,
    data: OutstandingCounter,
    in_progress: bool,
}

/// Anomalies seen while updating the write trackers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteAnomalies {
    /// A response arrived with no address outstanding.
    pub orphan_response_address: bool,
    /// A response arrived with no data burst outstanding.
    pub orphan_response_data: bool,
}

impl WriteAnomalies {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.orphan_response_address || self.orphan_response_data
    }
}

impl WriteTracker {
    #[must_use]
    pub const fn flags(&self) -> WriteFlags {
        WriteFlags {
            aw_outstanding: !self.address.is_zero(),
            w_outstanding: !self.data.is_zero(),
            in_progress: self.in_progress,
        }
    }

    /// Bursts whose address was accepted and whose response was not.
    #[must_use]
    pub const fn address_outstanding(&self) -> u32 {
        self.address.count()
    }

    /// Bursts whose last beat was accepted and whose response was not.
    #[must_use]
    pub const fn data_outstanding(&self) -> u32 {
        self.data.count()
    }

    #[must_use]
    pub const fn in_progress(&self) -> bool {
        self.in_progress
    }

    /// Outstanding depth: the larger of the address side and the data side,
    /// counting a partial data burst.
    #[must_use]
    pub fn depth(&self) -> u32 {
        let data = self
            .data
            .count()
            .saturating_add(u32::from(self.in_progress));
        self.address.count().max(data)
    }

    /// Nothing outstanding on either side and no partial burst.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.address.is_zero() && self.data.is_zero() && !self.in_progress
    }

    /// Apply one cycle's handshakes.
    pub const fn update(&mut self, events: &WriteEvents) -> WriteAnomalies {
        let address_ok = self.address.update(events.address, events.response);
        let data_ok = self.data.update(events.last_beat(), events.response);
        if let Some(last) = events.beat {
            self.in_progress = !last;
        }
        WriteAnomalies {
            orphan_response_address: !address_ok,
            orphan_response_data: !data_ok,
        }
    }

    pub const fn reset(&mut self) {
        self.address.reset();
        self.data.reset();
        self.in_progress = false;
    }
}

/// Registered read-side state, as seen by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadFlags {
    /// Some identifier is part way through returning a burst.
    pub any_returning: bool,
    /// Some burst has been requested and not fully returned.
    pub any_outstanding: bool,
}

/// Words in an identifier bitmap; covers every identifier up to
/// [`MAX_ID_WIDTH`](crate::config::MAX_ID_WIDTH) bits.
const BITMAP_WORDS: usize = 4;

/// One bit per read identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct IdBitmap([u64; BITMAP_WORDS]);

impl IdBitmap {
    const fn get(&self, id: u16) -> bool {
        let id = id as usize;
        self.0[id / 64] & (1 << (id % 64)) != 0
    }

    const fn set(&mut self, id: u16, on: bool) {
        let id = id as usize;
        let bit = 1u64 << (id % 64);
        if on {
            self.0[id / 64] |= bit;
        } else {
            self.0[id / 64] &= !bit;
        }
    }

    const fn count(&self) -> u32 {
        let mut n = 0;
        let mut i = 0;
        while i < BITMAP_WORDS {
            n += self.0[i].count_ones();
            i += 1;
        }
        n
    }

    const fn any(&self) -> bool {
        let mut i = 0;
        while i < BITMAP_WORDS {
            if self.0[i] != 0 {
                return true;
            }
            i += 1;
        }
        false
    }
}

/// Per-identifier read trackers.
#[derive(Debug, Clone)]
pub struct ReadTracker {
    slots: Box<[OutstandingCounter]>,
    /// Identifiers with an accepted address whose final beat is still owed.
    in_flight: IdBitmap,
    /// Identifiers that have started, but not finished, returning data.
    returning: IdBitmap,
    total: u32,
    id_mask: u16,
}

/// Anomalies seen while updating the read trackers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadAnomalies {
    /// A last beat arrived for an identifier with nothing outstanding.
    pub orphan_last_beat: Option<u16>,
}

impl ReadTracker {
    /// Tracker with `id_count` slots; `id_count` must be a power of two no
    /// larger than 256.
    #[must_use]
    pub fn new(id_count: usize) -> Self {
        debug_assert!(id_count.is_power_of_two() && id_count <= BITMAP_WORDS * 64);
        Self {
            slots: vec![OutstandingCounter::new(); id_count].into_boxed_slice(),
            in_flight: IdBitmap::default(),
            returning: IdBitmap::default(),
            total: 0,
            id_mask: u16::try_from(id_count - 1).unwrap_or(u16::MAX),
        }
    }

    #[must_use]
    pub const fn flags(&self) -> ReadFlags {
        ReadFlags {
            any_returning: self.returning.any(),
            any_outstanding: self.total != 0,
        }
    }

    /// Total bursts outstanding across every identifier.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    /// Bursts outstanding for one identifier (masked to the id width).
    #[must_use]
    pub fn outstanding(&self, id: u16) -> u32 {
        self.slots[usize::from(id & self.id_mask)].count()
    }

    /// Whether an identifier has an address accepted and its final beat owed.
    #[must_use]
    pub const fn is_in_flight(&self, id: u16) -> bool {
        self.in_flight.get(id & self.id_mask)
    }

    /// Number of identifiers concurrently in flight. Never exceeds the
    /// number of distinct identifiers.
    #[must_use]
    pub const fn in_flight_count(&self) -> u32 {
        self.in_flight.count()
    }

    /// Whether an identifier is part way through returning a burst.
    #[must_use]
    pub const fn is_returning(&self, id: u16) -> bool {
        self.returning.get(id & self.id_mask)
    }

    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.total == 0
    }

    /// Apply one cycle's handshakes.
    pub fn update(&mut self, events: &ReadEvents) -> ReadAnomalies {
        let start = events.address.map(|id| id & self.id_mask);
        let end = events
            .beat
            .and_then(|(id, last)| last.then_some(id & self.id_mask));

        let mut anomalies = ReadAnomalies::default();
        match (start, end) {
            (Some(s), Some(e)) if s == e => {
                self.slots[usize::from(s)].update(true, true);
            }
            _ => {
                if let Some(s) = start {
                    self.slots[usize::from(s)].update(true, false);
                    self.total = self.total.saturating_add(1);
                }
                if let Some(e) = end {
                    if self.slots[usize::from(e)].update(false, true) {
                        self.total -= 1;
                    } else {
                        anomalies.orphan_last_beat = Some(e);
                    }
                }
            }
        }
        for id in start.into_iter().chain(end) {
            let busy = !self.slots[usize::from(id)].is_zero();
            self.in_flight.set(id, busy);
        }

        if let Some((id, last)) = events.beat {
            let id = id & self.id_mask;
            let returning = !last && !self.slots[usize::from(id)].is_zero();
            self.returning.set(id, returning);
        }
        anomalies
    }

    pub fn reset(&mut self) {
        self.slots.iter_mut().for_each(OutstandingCounter::reset);
        self.in_flight = IdBitmap::default();
        self.returning = IdBitmap::default();
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rules() {
        let mut c = OutstandingCounter::new();
        assert!(c.is_zero());
        assert!(c.update(true, false));
        assert!(c.update(true, false));
        assert_eq!(c.count(), 2);
        assert!(c.update(true, true));
        assert_eq!(c.count(), 2);
        assert!(c.update(false, true));
        assert!(!c.is_zero());
        assert!(c.update(false, true));
        assert!(c.is_zero());
        assert!(c.update(false, false));
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn test_counter_never_underflows() {
        let mut c = OutstandingCounter::new();
        assert!(!c.update(false, true));
        assert_eq!(c.count(), 0);
        assert!(c.is_zero());
    }

    #[test]
    fn test_write_tracker_address_first() {
        let mut t = WriteTracker::default();
        t.update(&WriteEvents {
            address: true,
            ..Default::default()
        });
        assert_eq!(
            t.flags(),
            WriteFlags {
                aw_outstanding: true,
                w_outstanding: false,
                in_progress: false
            }
        );
        t.update(&WriteEvents {
            beat: Some(false),
            ..Default::default()
        });
        assert!(t.in_progress());
        assert_eq!(t.depth(), 1);
        t.update(&WriteEvents {
            beat: Some(true),
            ..Default::default()
        });
        assert!(!t.in_progress());
        assert_eq!(t.data_outstanding(), 1);
        let anomalies = t.update(&WriteEvents {
            response: true,
            ..Default::default()
        });
        assert!(!anomalies.any());
        assert!(t.is_drained());
    }

    #[test]
    fn test_write_tracker_data_first() {
        let mut t = WriteTracker::default();
        t.update(&WriteEvents {
            beat: Some(true),
            ..Default::default()
        });
        let flags = t.flags();
        assert!(!flags.aw_outstanding);
        assert!(flags.w_outstanding);
        t.update(&WriteEvents {
            address: true,
            ..Default::default()
        });
        assert_eq!(t.address_outstanding(), 1);
        t.update(&WriteEvents {
            response: true,
            ..Default::default()
        });
        assert!(t.is_drained());
    }

    #[test]
    fn test_write_tracker_orphan_response() {
        let mut t = WriteTracker::default();
        let anomalies = t.update(&WriteEvents {
            response: true,
            ..Default::default()
        });
        assert!(anomalies.orphan_response_address);
        assert!(anomalies.orphan_response_data);
        assert!(t.is_drained());
    }

    #[test]
    fn test_read_tracker_per_id() {
        let mut t = ReadTracker::new(16);
        t.update(&ReadEvents {
            address: Some(2),
            beat: None,
        });
        t.update(&ReadEvents {
            address: Some(9),
            beat: None,
        });
        assert_eq!(t.total(), 2);
        assert!(t.flags().any_outstanding);
        assert!(!t.flags().any_returning);
        assert!(t.is_in_flight(2));
        assert!(t.is_in_flight(9));
        assert_eq!(t.in_flight_count(), 2);

        t.update(&ReadEvents {
            address: None,
            beat: Some((9, false)),
        });
        assert!(t.is_returning(9));
        assert!(!t.is_returning(2));
        assert!(t.flags().any_returning);

        t.update(&ReadEvents {
            address: None,
            beat: Some((9, true)),
        });
        assert!(!t.is_returning(9));
        assert!(!t.is_in_flight(9));
        assert!(t.is_in_flight(2));
        assert_eq!(t.in_flight_count(), 1);
        assert_eq!(t.outstanding(9), 0);
        assert_eq!(t.outstanding(2), 1);
        assert_eq!(t.total(), 1);
    }

    #[test]
    fn test_read_tracker_single_beat_bursts() {
        let mut t = ReadTracker::new(4);
        t.update(&ReadEvents {
            address: Some(1),
            beat: None,
        });
        t.update(&ReadEvents {
            address: Some(2),
            beat: Some((1, true)),
        });
        assert!(!t.is_in_flight(1));
        assert!(t.is_in_flight(2));
        assert!(!t.flags().any_returning);
        t.update(&ReadEvents {
            address: None,
            beat: Some((2, true)),
        });
        assert_eq!(t.in_flight_count(), 0);
        assert!(t.is_drained());
    }

    #[test]
    fn test_read_tracker_same_id_bursts_share_a_bit() {
        let mut t = ReadTracker::new(4);
        for _ in 0..3 {
            t.update(&ReadEvents {
                address: Some(3),
                beat: None,
            });
        }
        assert_eq!(t.total(), 3);
        assert_eq!(t.in_flight_count(), 1);
        t.update(&ReadEvents {
            address: None,
            beat: Some((3, true)),
        });
        assert!(t.is_in_flight(3));
    }

    #[test]
    fn test_read_tracker_same_id_start_and_end() {
        let mut t = ReadTracker::new(4);
        t.update(&ReadEvents {
            address: Some(1),
            beat: None,
        });
        t.update(&ReadEvents {
            address: Some(1),
            beat: Some((1, true)),
        });
        assert_eq!(t.outstanding(1), 1);
        assert_eq!(t.total(), 1);
    }

    #[test]
    fn test_read_tracker_masks_ids() {
        let mut t = ReadTracker::new(4);
        t.update(&ReadEvents {
            address: Some(0x13),
            beat: None,
        });
        assert_eq!(t.outstanding(3), 1);
        let anomalies = t.update(&ReadEvents {
            address: None,
            beat: Some((2, true)),
        });
        assert_eq!(anomalies.orphan_last_beat, Some(2));
        assert_eq!(t.total(), 1);
    }

    #[test]
    fn test_read_tracker_ignores_beats_without_address() {
        let mut t = ReadTracker::new(4);
        t.update(&ReadEvents {
            address: None,
            beat: Some((1, false)),
        });
        assert!(!t.is_returning(1));
        assert_eq!(t.in_flight_count(), 0);
    }

    #[test]
    fn test_read_tracker_high_ids() {
        let mut t = ReadTracker::new(256);
        t.update(&ReadEvents {
            address: Some(200),
            beat: None,
        });
        t.update(&ReadEvents {
            address: Some(7),
            beat: Some((200, false)),
        });
        t.update(&ReadEvents {
            address: None,
            beat: Some((7, false)),
        });
        assert!(t.is_returning(200));
        assert!(t.is_returning(7));
        assert_eq!(t.in_flight_count(), 2);
        t.reset();
        assert_eq!(t.in_flight_count(), 0);
        assert!(!t.flags().any_returning);
        assert!(t.is_drained());
    }
}
