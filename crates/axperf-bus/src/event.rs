//! Handshake events derived from a cycle's valid/ready pairs.
//!
//! Events are evaluated combinationally each cycle and never stored. Several
//! events can fire on the same cycle (an address and a data beat, say).

use crate::{ReadSignals, WriteSignals};

/// One accepted write-side handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEvent {
    AddressAccepted,
    DataBeatAccepted { last: bool },
    ResponseAccepted,
}

/// One accepted read-side handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEvent {
    AddressAccepted { id: u16 },
    DataBeatAccepted { last: bool, id: u16 },
}

/// All write-side handshakes of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteEvents {
    /// AW handshake.
    pub address: bool,
    /// W handshake, carrying WLAST.
    pub beat: Option<bool>,
    /// B handshake.
    pub response: bool,
}

impl WriteEvents {
    /// Derive the events of a cycle.
    #[must_use]
    pub const fn from_signals(signals: &WriteSignals) -> Self {
        Self {
            address: signals.aw_fire(),
            beat: if signals.w_fire() {
                Some(signals.w_last)
            } else {
                None
            },
            response: signals.b_fire(),
        }
    }

    /// A W handshake that ends a burst.
    #[must_use]
    pub const fn last_beat(&self) -> bool {
        matches!(self.beat, Some(true))
    }

    /// Events in channel order (AW, W, B).
    pub fn iter(&self) -> impl Iterator<Item = WriteEvent> {
        [
            self.address.then_some(WriteEvent::AddressAccepted),
            self.beat.map(|last| WriteEvent::DataBeatAccepted { last }),
            self.response.then_some(WriteEvent::ResponseAccepted),
        ]
        .into_iter()
        .flatten()
    }
}

/// All read-side handshakes of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadEvents {
    /// AR handshake, carrying ARID.
    pub address: Option<u16>,
    /// R handshake, carrying `(RID, RLAST)`.
    pub beat: Option<(u16, bool)>,
}

impl ReadEvents {
    /// Derive the events of a cycle.
    #[must_use]
    pub const fn from_signals(signals: &ReadSignals) -> Self {
        Self {
            address: if signals.ar_fire() {
                Some(signals.ar_id)
            } else {
                None
            },
            beat: if signals.r_fire() {
                Some((signals.r_id, signals.r_last))
            } else {
                None
            },
        }
    }

    /// Events in channel order (AR, R).
    pub fn iter(&self) -> impl Iterator<Item = ReadEvent> {
        [
            self.address.map(|id| ReadEvent::AddressAccepted { id }),
            self.beat
                .map(|(id, last)| ReadEvent::DataBeatAccepted { last, id }),
        ]
        .into_iter()
        .flatten()
    }
}
