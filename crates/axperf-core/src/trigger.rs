//! Start/stop/clear control.
//!
//! Requests are latched when the control register is written and resolved on
//! the next tick. Clear acts on that tick unconditionally; start and stop wait
//! for a tick on which the bus is idle so a burst is never sampled half way.

use tracing::debug;

/// A decoded control-register request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    Start,
    Stop,
    /// Zero every counter. Implies stop.
    Clear,
}

/// Control register write bits.
pub mod control_bits {
    /// 1 = start, 0 = stop.
    pub const START: u64 = 1 << 0;
    /// Clear (wins over start).
    pub const CLEAR: u64 = 1 << 1;
}

/// Control register status bits.
pub mod status_bits {
    pub const TRIGGERED: u64 = 1 << 0;
    pub const CLEAR_PENDING: u64 = 1 << 1;
    pub const START_PENDING: u64 = 1 << 2;
    pub const STOP_PENDING: u64 = 1 << 3;
}

impl ControlRequest {
    /// Decode a control register write.
    ///
    /// Returns `None` when byte lane 0 is not enabled.
    #[must_use]
    pub const fn decode(data: u64, strb: u8) -> Option<Self> {
        if strb & 1 == 0 {
            return None;
        }
        Some(if data & control_bits::CLEAR != 0 {
            Self::Clear
        } else if data & control_bits::START != 0 {
            Self::Start
        } else {
            Self::Stop
        })
    }
}

/// Outcome of one tick of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTransition {
    /// Counters must be zeroed; counting is stopped.
    Cleared,
    Started,
    Stopped,
}

/// The control state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerController {
    triggered: bool,
    start_pending: bool,
    stop_pending: bool,
    clear_pending: bool,
}

impl TriggerController {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            triggered: false,
            start_pending: false,
            stop_pending: false,
            clear_pending: false,
        }
    }

    /// Whether counting is enabled.
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        self.triggered
    }

    #[must_use]
    pub const fn start_pending(&self) -> bool {
        self.start_pending
    }

    #[must_use]
    pub const fn stop_pending(&self) -> bool {
        self.stop_pending
    }

    #[must_use]
    pub const fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    /// Latch a request until the next tick.
    pub fn request(&mut self, request: ControlRequest) {
        debug!(?request, "control request latched");
        match request {
            ControlRequest::Start => {
                self.start_pending = true;
                self.stop_pending = false;
            }
            ControlRequest::Stop => {
                self.stop_pending = true;
                self.start_pending = false;
            }
            ControlRequest::Clear => {
                self.clear_pending = true;
                self.start_pending = false;
                self.stop_pending = false;
            }
        }
    }

    /// Resolve pending requests at the end of a cycle.
    ///
    /// A clear resolved on this tick also consumes a start or stop latched
    /// after it, if the bus is idle.
    pub const fn tick(&mut self, bus_idle: bool) -> Option<TriggerTransition> {
        if self.clear_pending {
            self.clear_pending = false;
            self.stop_pending = false;
            self.triggered = bus_idle && self.start_pending;
            if self.triggered {
                self.start_pending = false;
            }
            return Some(TriggerTransition::Cleared);
        }
        if !bus_idle {
            return None;
        }
        if self.start_pending {
            self.start_pending = false;
            let was = self.triggered;
            self.triggered = true;
            return if was {
                None
            } else {
                Some(TriggerTransition::Started)
            };
        }
        if self.stop_pending {
            self.stop_pending = false;
            let was = self.triggered;
            self.triggered = false;
            return if was {
                Some(TriggerTransition::Stopped)
            } else {
                None
            };
        }
        None
    }

    /// Control/status register value.
    #[must_use]
    pub const fn status(&self) -> u64 {
        let mut status = 0;
        if self.triggered {
            status |= status_bits::TRIGGERED;
        }
        if self.clear_pending {
            status |= status_bits::CLEAR_PENDING;
        }
        if self.start_pending {
            status |= status_bits::START_PENDING;
        }
        if self.stop_pending {
            status |= status_bits::STOP_PENDING;
        }
        status
    }

    pub const fn reset(&mut self) {
        *self = Self::new();
    }
}
