//! Register map.
//!
//! Registers sit at `index * register_bytes`; the low address bits inside a
//! register are ignored. Values are truncated to the register data width.

use crate::bank::CounterBank;
use crate::read::ReadCategory;
use crate::write::WriteCategory;

/// Exported registers, in address order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    ActiveTime,
    MaxComposite,
    WrIdle,
    WrBursts,
    WrBeats,
    WrAddrBytes,
    WrDataBytes,
    WrSlowData,
    WrStall,
    WrAddrLag,
    WrDataLag,
    WrEarlyBeat,
    WrEarlyAddrStall,
    WrEarlyDataStall,
    WrAddrLagEarlyResp,
    WrEarlyRespLag,
    WrRespLag,
    WrRespStall,
    WrLastBeats,
    WrResponses,
    WrBias,
    RdIdle,
    RdMaxResponding,
    RdBursts,
    RdBeats,
    RdBytes,
    RdAddrStall,
    RdDataStall,
    RdLag,
    RdSlowLink,
    RdAddrCycles,
    Control,
}

impl Register {
    pub const COUNT: usize = 32;

    pub const ALL: [Self; Self::COUNT] = [
        Self::ActiveTime,
        Self::MaxComposite,
        Self::WrIdle,
        Self::WrBursts,
        Self::WrBeats,
        Self::WrAddrBytes,
        Self::WrDataBytes,
        Self::WrSlowData,
        Self::WrStall,
        Self::WrAddrLag,
        Self::WrDataLag,
        Self::WrEarlyBeat,
        Self::WrEarlyAddrStall,
        Self::WrEarlyDataStall,
        Self::WrAddrLagEarlyResp,
        Self::WrEarlyRespLag,
        Self::WrRespLag,
        Self::WrRespStall,
        Self::WrLastBeats,
        Self::WrResponses,
        Self::WrBias,
        Self::RdIdle,
        Self::RdMaxResponding,
        Self::RdBursts,
        Self::RdBeats,
        Self::RdBytes,
        Self::RdAddrStall,
        Self::RdDataStall,
        Self::RdLag,
        Self::RdSlowLink,
        Self::RdAddrCycles,
        Self::Control,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: u64) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Decode a byte address.
    #[must_use]
    pub fn decode(addr: u64, register_bytes: u64) -> Option<Self> {
        Self::from_index(addr / register_bytes)
    }

    /// Byte address of this register.
    #[must_use]
    pub const fn address(self, register_bytes: u64) -> u64 {
        self.index() as u64 * register_bytes
    }

    /// The write-side category a register exports, if any.
    #[must_use]
    pub const fn write_category(self) -> Option<WriteCategory> {
        Some(match self {
            Self::WrIdle => WriteCategory::Idle,
            Self::WrSlowData => WriteCategory::SlowData,
            Self::WrStall => WriteCategory::Stall,
            Self::WrAddrLag => WriteCategory::AddressLag,
            Self::WrDataLag => WriteCategory::DataLag,
            Self::WrEarlyBeat => WriteCategory::EarlyBeat,
            Self::WrEarlyAddrStall => WriteCategory::EarlyAddressStall,
            Self::WrEarlyDataStall => WriteCategory::EarlyDataStall,
            Self::WrAddrLagEarlyResp => WriteCategory::AddressLagEarlyResponse,
            Self::WrEarlyRespLag => WriteCategory::EarlyResponseLag,
            Self::WrRespLag => WriteCategory::ResponseLag,
            Self::WrRespStall => WriteCategory::ResponseStall,
            _ => return None,
        })
    }

    /// The read-side category a register exports, if any.
    #[must_use]
    pub const fn read_category(self) -> Option<ReadCategory> {
        Some(match self {
            Self::RdIdle => ReadCategory::Idle,
            Self::RdAddrStall => ReadCategory::AddressStall,
            Self::RdDataStall => ReadCategory::DataStall,
            Self::RdLag => ReadCategory::Lag,
            Self::RdSlowLink => ReadCategory::SlowLink,
            Self::RdAddrCycles => ReadCategory::AddressCycle,
            _ => return None,
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ActiveTime => "active_time",
            Self::MaxComposite => "max_composite",
            Self::WrIdle => "wr_idle",
            Self::WrBursts => "wr_bursts",
            Self::WrBeats => "wr_beats",
            Self::WrAddrBytes => "wr_addr_bytes",
            Self::WrDataBytes => "wr_data_bytes",
            Self::WrSlowData => "wr_slow_data",
            Self::WrStall => "wr_stall",
            Self::WrAddrLag => "wr_addr_lag",
            Self::WrDataLag => "wr_data_lag",
            Self::WrEarlyBeat => "wr_early_beat",
            Self::WrEarlyAddrStall => "wr_early_addr_stall",
            Self::WrEarlyDataStall => "wr_early_data_stall",
            Self::WrAddrLagEarlyResp => "wr_addr_lag_early_resp",
            Self::WrEarlyRespLag => "wr_early_resp_lag",
            Self::WrRespLag => "wr_resp_lag",
            Self::WrRespStall => "wr_resp_stall",
            Self::WrLastBeats => "wr_last_beats",
            Self::WrResponses => "wr_responses",
            Self::WrBias => "wr_bias",
            Self::RdIdle => "rd_idle",
            Self::RdMaxResponding => "rd_max_responding",
            Self::RdBursts => "rd_bursts",
            Self::RdBeats => "rd_beats",
            Self::RdBytes => "rd_bytes",
            Self::RdAddrStall => "rd_addr_stall",
            Self::RdDataStall => "rd_data_stall",
            Self::RdLag => "rd_lag",
            Self::RdSlowLink => "rd_slow_link",
            Self::RdAddrCycles => "rd_addr_cycles",
            Self::Control => "control",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ActiveTime => "Cycles counted while triggered",
            Self::MaxComposite => {
                "[7:0] wr max outstanding, [15:8] max AWLEN, [23:16] rd max outstanding, [31:24] max ARLEN"
            }
            Self::WrIdle => "Write channel idle",
            Self::WrBursts => "AW handshakes",
            Self::WrBeats => "W handshakes",
            Self::WrAddrBytes => "Bytes announced by AW (len+1 << size)",
            Self::WrDataBytes => "Bytes carried by W (strobe population)",
            Self::WrSlowData => "Burst under way, no data this cycle",
            Self::WrStall => "W valid, not ready",
            Self::WrAddrLag => "Data under way, address not accepted",
            Self::WrDataLag => "Address accepted, data not started",
            Self::WrEarlyBeat => "Beat accepted before any address",
            Self::WrEarlyAddrStall => "Address stalled before any data",
            Self::WrEarlyDataStall => "Data stalled before any address",
            Self::WrAddrLagEarlyResp => "Data complete, waiting on its address",
            Self::WrEarlyRespLag => "Address accepted with nothing else in flight",
            Self::WrRespLag => "Waiting for the write response",
            Self::WrRespStall => "B valid, not ready",
            Self::WrLastBeats => "W handshakes with WLAST",
            Self::WrResponses => "B handshakes",
            Self::WrBias => "Data-lag minus address-lag cycles (signed)",
            Self::RdIdle => "Read channel idle",
            Self::RdMaxResponding => "Most identifiers in flight at once",
            Self::RdBursts => "AR handshakes",
            Self::RdBeats => "R handshakes",
            Self::RdBytes => "Bytes requested by AR (len+1 << size)",
            Self::RdAddrStall => "AR valid, not ready",
            Self::RdDataStall => "R valid, not ready",
            Self::RdLag => "Bursts outstanding, none returning",
            Self::RdSlowLink => "Burst part way returned, no beat this cycle",
            Self::RdAddrCycles => "Address accepted, otherwise idle",
            Self::Control => "[0] triggered, [1] clear pending, [2] start pending, [3] stop pending",
        }
    }
}

fn saturate_u8(value: u32) -> u64 {
    u64::from(u8::try_from(value).unwrap_or(u8::MAX))
}

/// Pack the watermark register.
#[must_use]
pub fn pack_max_composite(bank: &CounterBank) -> u64 {
    let w = bank.write();
    let r = bank.read();
    saturate_u8(w.max_outstanding())
        | saturate_u8(w.max_burst_len()) << 8
        | saturate_u8(r.max_outstanding()) << 16
        | saturate_u8(r.max_burst_len()) << 24
}

/// Value of a counter register. `status` is the control register value.
#[must_use]
pub fn register_value(register: Register, bank: &CounterBank, status: u64) -> u64 {
    if let Some(category) = register.write_category() {
        return bank.write().category(category);
    }
    if let Some(category) = register.read_category() {
        return bank.read().category(category);
    }
    let w = bank.write();
    let r = bank.read();
    match register {
        Register::ActiveTime => bank.active_time(),
        Register::MaxComposite => pack_max_composite(bank),
        Register::WrBursts => w.bursts(),
        Register::WrBeats => w.beats(),
        Register::WrAddrBytes => w.address_bytes(),
        Register::WrDataBytes => w.data_bytes(),
        Register::WrLastBeats => w.last_beats(),
        Register::WrResponses => w.responses(),
        // Two's complement; the caller truncates to the data width.
        #[allow(clippy::cast_sign_loss)]
        Register::WrBias => w.bias() as u64,
        Register::RdMaxResponding => u64::from(r.max_responding()),
        Register::RdBursts => r.bursts(),
        Register::RdBeats => r.beats(),
        Register::RdBytes => r.bytes(),
        Register::Control => status,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_order() {
        for (i, reg) in Register::ALL.iter().enumerate() {
            assert_eq!(reg.index(), i);
            assert_eq!(Register::from_index(i as u64), Some(*reg));
        }
        assert_eq!(Register::from_index(32), None);
        assert_eq!(Register::Control.index(), 31);
    }

    #[test]
    fn test_decode_addresses() {
        assert_eq!(Register::decode(0x00, 4), Some(Register::ActiveTime));
        assert_eq!(Register::decode(0x07, 4), Some(Register::MaxComposite));
        assert_eq!(Register::decode(0x7c, 4), Some(Register::Control));
        assert_eq!(Register::decode(0x80, 4), None);
        assert_eq!(Register::decode(0xf8, 8), Some(Register::Control));
        assert_eq!(Register::Control.address(4), 0x7c);
    }

    #[test]
    fn test_every_category_has_a_register() {
        for c in WriteCategory::ALL {
            assert!(Register::ALL.iter().any(|r| r.write_category() == Some(c)));
        }
        for c in ReadCategory::ALL {
            assert!(Register::ALL.iter().any(|r| r.read_category() == Some(c)));
        }
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = Register::ALL.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Register::COUNT);
    }
}
