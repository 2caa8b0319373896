//! Monitor configuration.

use thiserror::Error;

/// Largest supported identifier width. Per-identifier state is a fixed table
/// of `1 << id_width` slots.
pub const MAX_ID_WIDTH: u8 = 8;

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("identifier width {0} exceeds the maximum of {MAX_ID_WIDTH} bits")]
    IdWidth(u8),

    #[error("counter width {0} must be between 1 and 64 bits")]
    CounterWidth(u32),

    #[error("register data width {0} must be 32 or 64 bits")]
    DataWidth(u32),
}

/// Monitor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Width of ARID/RID. Identifiers are masked to this width.
    pub id_width: u8,
    /// Width of every counter; increments wrap silently modulo `2^width`.
    pub counter_width: u32,
    /// Register data width. Register values are truncated to it.
    pub data_width: u32,
}

impl MonitorConfig {
    /// Default configuration: 4-bit identifiers, 32-bit counters and registers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            id_width: 4,
            counter_width: 32,
            data_width: 32,
        }
    }

    #[must_use]
    pub const fn with_id_width(mut self, id_width: u8) -> Self {
        self.id_width = id_width;
        self
    }

    #[must_use]
    pub const fn with_counter_width(mut self, counter_width: u32) -> Self {
        self.counter_width = counter_width;
        self
    }

    #[must_use]
    pub const fn with_data_width(mut self, data_width: u32) -> Self {
        self.data_width = data_width;
        self
    }

    /// Check every field against its supported range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range field.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.id_width > MAX_ID_WIDTH {
            return Err(ConfigError::IdWidth(self.id_width));
        }
        if self.counter_width == 0 || self.counter_width > 64 {
            return Err(ConfigError::CounterWidth(self.counter_width));
        }
        if self.data_width != 32 && self.data_width != 64 {
            return Err(ConfigError::DataWidth(self.data_width));
        }
        Ok(())
    }

    /// Number of identifier slots.
    #[must_use]
    pub const fn id_count(&self) -> usize {
        1 << self.id_width
    }

    /// Mask applied to incoming identifiers.
    #[must_use]
    pub const fn id_mask(&self) -> u16 {
        ((1u32 << self.id_width) - 1) as u16
    }

    /// Mask applied to register read data.
    #[must_use]
    pub const fn data_mask(&self) -> u64 {
        width_mask(self.data_width)
    }

    /// Register stride in bytes.
    #[must_use]
    pub const fn register_bytes(&self) -> u64 {
        (self.data_width / 8) as u64
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// All-ones mask of `width` bits (`width` in 1..=64).
#[must_use]
pub const fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.id_count(), 16);
        assert_eq!(config.id_mask(), 0xf);
        assert_eq!(config.data_mask(), 0xffff_ffff);
        assert_eq!(config.register_bytes(), 4);
    }

    #[test]
    fn test_builder_and_validation() {
        let config = MonitorConfig::new()
            .with_id_width(8)
            .with_counter_width(64)
            .with_data_width(64);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.id_count(), 256);
        assert_eq!(config.id_mask(), 0xff);
        assert_eq!(config.register_bytes(), 8);

        let zero_ids = MonitorConfig::new().with_id_width(0);
        assert_eq!(zero_ids.validate(), Ok(()));
        assert_eq!(zero_ids.id_count(), 1);
        assert_eq!(zero_ids.id_mask(), 0);

        assert_eq!(
            MonitorConfig::new().with_id_width(9).validate(),
            Err(ConfigError::IdWidth(9))
        );
        assert_eq!(
            MonitorConfig::new().with_counter_width(0).validate(),
            Err(ConfigError::CounterWidth(0))
        );
        assert_eq!(
            MonitorConfig::new().with_counter_width(65).validate(),
            Err(ConfigError::CounterWidth(65))
        );
        assert_eq!(
            MonitorConfig::new().with_data_width(16).validate(),
            Err(ConfigError::DataWidth(16))
        );
    }

    #[test]
    fn test_width_mask() {
        assert_eq!(width_mask(1), 1);
        assert_eq!(width_mask(32), 0xffff_ffff);
        assert_eq!(width_mask(64), u64::MAX);
    }
}
