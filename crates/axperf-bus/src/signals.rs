//! Per-cycle channel signal snapshots.

/// Width of the AxSIZE field in bits.
pub const AXSIZE_BITS: u32 = 3;

/// Bytes moved by one burst: `(len + 1) << size`.
///
/// `size` is the AxSIZE field, so only its low three bits are used.
#[must_use]
pub const fn burst_bytes(len: u8, size: u8) -> u64 {
    (len as u64 + 1) << (size & ((1 << AXSIZE_BITS) - 1))
}

/// Write-side signals sampled on one clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSignals {
    pub aw_valid: bool,
    pub aw_ready: bool,
    /// AWLEN: beats in the burst minus one.
    pub aw_len: u8,
    /// AWSIZE: log2 of the bytes per beat.
    pub aw_size: u8,
    pub w_valid: bool,
    pub w_ready: bool,
    pub w_last: bool,
    /// WSTRB: one bit per active byte lane (up to 1024-bit data).
    pub w_strb: u128,
    pub b_valid: bool,
    pub b_ready: bool,
}

impl WriteSignals {
    /// AW handshake this cycle.
    #[must_use]
    pub const fn aw_fire(&self) -> bool {
        self.aw_valid && self.aw_ready
    }

    /// W handshake this cycle.
    #[must_use]
    pub const fn w_fire(&self) -> bool {
        self.w_valid && self.w_ready
    }

    /// B handshake this cycle.
    #[must_use]
    pub const fn b_fire(&self) -> bool {
        self.b_valid && self.b_ready
    }

    /// Whether any write sub-channel has VALID asserted.
    #[must_use]
    pub const fn any_valid(&self) -> bool {
        self.aw_valid || self.w_valid || self.b_valid
    }

    /// Bytes announced by the address phase (zero without an AW handshake).
    #[must_use]
    pub const fn address_bytes(&self) -> u64 {
        if self.aw_fire() {
            burst_bytes(self.aw_len, self.aw_size)
        } else {
            0
        }
    }

    /// Bytes carried by this cycle's data beat, counted from the strobes.
    #[must_use]
    pub const fn strobe_bytes(&self) -> u64 {
        if self.w_fire() {
            self.w_strb.count_ones() as u64
        } else {
            0
        }
    }
}

/// Read-side signals sampled on one clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadSignals {
    pub ar_valid: bool,
    pub ar_ready: bool,
    /// ARID.
    pub ar_id: u16,
    /// ARLEN: beats in the burst minus one.
    pub ar_len: u8,
    /// ARSIZE: log2 of the bytes per beat.
    pub ar_size: u8,
    pub r_valid: bool,
    pub r_ready: bool,
    pub r_last: bool,
    /// RID.
    pub r_id: u16,
}

impl ReadSignals {
    /// AR handshake this cycle.
    #[must_use]
    pub const fn ar_fire(&self) -> bool {
        self.ar_valid && self.ar_ready
    }

    /// R handshake this cycle.
    #[must_use]
    pub const fn r_fire(&self) -> bool {
        self.r_valid && self.r_ready
    }

    /// Whether any read sub-channel has VALID asserted.
    #[must_use]
    pub const fn any_valid(&self) -> bool {
        self.ar_valid || self.r_valid
    }

    /// Bytes requested by the address phase (zero without an AR handshake).
    #[must_use]
    pub const fn address_bytes(&self) -> u64 {
        if self.ar_fire() {
            burst_bytes(self.ar_len, self.ar_size)
        } else {
            0
        }
    }
}

/// Everything the monitor samples on one clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusCycle {
    pub write: WriteSignals,
    pub read: ReadSignals,
}

impl BusCycle {
    /// A cycle with every VALID and READY low.
    #[must_use]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Whether any VALID is asserted on either channel.
    #[must_use]
    pub const fn any_valid(&self) -> bool {
        self.write.any_valid() || self.read.any_valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_bytes() {
        assert_eq!(burst_bytes(0, 0), 1);
        assert_eq!(burst_bytes(3, 2), 16);
        assert_eq!(burst_bytes(255, 7), 256 * 128);
        // AxSIZE is a three-bit field
        assert_eq!(burst_bytes(0, 0x0a), burst_bytes(0, 2));
    }

    #[test]
    fn test_write_handshakes() {
        let w = WriteSignals {
            aw_valid: true,
            aw_ready: false,
            w_valid: true,
            w_ready: true,
            w_strb: 0b1011,
            b_ready: true,
            ..Default::default()
        };
        assert!(!w.aw_fire());
        assert!(w.w_fire());
        assert!(!w.b_fire());
        assert!(w.any_valid());
        assert_eq!(w.address_bytes(), 0);
        assert_eq!(w.strobe_bytes(), 3);
    }

    #[test]
    fn test_ready_alone_is_not_valid() {
        let cycle = BusCycle {
            write: WriteSignals {
                aw_ready: true,
                w_ready: true,
                b_ready: true,
                ..Default::default()
            },
            read: ReadSignals {
                ar_ready: true,
                r_ready: true,
                ..Default::default()
            },
        };
        assert!(!cycle.any_valid());
        assert!(!BusCycle::idle().any_valid());
    }

    #[test]
    fn test_read_address_bytes() {
        let r = ReadSignals {
            ar_valid: true,
            ar_ready: true,
            ar_len: 7,
            ar_size: 3,
            ..Default::default()
        };
        assert!(r.ar_fire());
        assert_eq!(r.address_bytes(), 64);
    }
}
