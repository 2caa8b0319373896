//! Width-limited wrapping counters.

use crate::config::width_mask;

/// Counter width shared by every counter in a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterWidth {
    mask: u64,
}

impl CounterWidth {
    /// Width in bits, 1..=64.
    #[must_use]
    pub const fn new(bits: u32) -> Self {
        Self {
            mask: width_mask(bits),
        }
    }

    /// Reinterpret the low `width` bits of `value` as a signed number.
    #[must_use]
    pub const fn sign_extend(self, value: i64) -> i64 {
        let shift = 64 - self.mask.count_ones();
        (value << shift) >> shift
    }
}

/// Monotonic non-negative counter. Wraps modulo `2^width` on overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counter(u64);

impl Counter {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn increment(&mut self, width: CounterWidth) {
        self.add(1, width);
    }

    pub const fn add(&mut self, amount: u64, width: CounterWidth) {
        self.0 = self.0.wrapping_add(amount) & width.mask;
    }

    pub const fn clear(&mut self) {
        self.0 = 0;
    }
}

/// Signed counter. Wraps within `width` bits, two's complement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignedCounter(i64);

impl SignedCounter {
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn increment(&mut self, width: CounterWidth) {
        self.0 = width.sign_extend(self.0.wrapping_add(1));
    }

    pub const fn decrement(&mut self, width: CounterWidth) {
        self.0 = width.sign_extend(self.0.wrapping_sub(1));
    }
}

/// Advance-only watermark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Watermark(u32);

impl Watermark {
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn observe(&mut self, value: u32) {
        if value > self.0 {
            self.0 = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_wraps_silently() {
        let width = CounterWidth::new(4);
        let mut c = Counter::default();
        c.add(15, width);
        assert_eq!(c.get(), 15);
        c.increment(width);
        assert_eq!(c.get(), 0);
        c.add(18, width);
        assert_eq!(c.get(), 2);
    }

    #[test]
    fn test_counter_full_width() {
        let width = CounterWidth::new(64);
        let mut c = Counter::default();
        c.add(u64::MAX, width);
        c.increment(width);
        assert_eq!(c.get(), 0);
    }

    #[test]
    fn test_watermark_only_advances() {
        let mut w = Watermark::default();
        w.observe(3);
        w.observe(1);
        assert_eq!(w.get(), 3);
        w.observe(7);
        assert_eq!(w.get(), 7);
    }

    #[test]
    fn test_signed_counter_wraps_within_width() {
        let width = CounterWidth::new(4);
        let mut c = SignedCounter::default();
        for _ in 0..7 {
            c.increment(width);
        }
        assert_eq!(c.get(), 7);
        c.increment(width);
        assert_eq!(c.get(), -8);
        for _ in 0..9 {
            c.decrement(width);
        }
        assert_eq!(c.get(), 7);
    }

    #[test]
    fn test_signed_counter_full_width() {
        let width = CounterWidth::new(64);
        let mut c = SignedCounter::default();
        c.decrement(width);
        assert_eq!(c.get(), -1);
        c.increment(width);
        c.increment(width);
        assert_eq!(c.get(), 1);
    }
}
