//! Bit patterns that reproduce the ws2812 waveform when shifted out of spi.
//!
//! Every protocol bit is sent as `N` spi bytes. The leading bits of those
//! bytes are high, the rest low, so the high time of the data line is the
//! number of set bits times the spi bit period.

// Timings for ws2812 from https://cpldcpu.files.wordpress.com/2014/01/ws2812_timing_table.png

use crate::error::{Bit, TimingError};

/// Nominal ws2812 high time of a zero bit
pub const WS2812_T0H_NS: u32 = 400;
/// Nominal ws2812 high time of a one bit
pub const WS2812_T1H_NS: u32 = 800;
/// Allowed deviation from the nominal high times
pub const WS2812_TOLERANCE_NS: u32 = 150;

/// Length of one spi bit in nanoseconds, rounded to the nearest nanosecond.
///
/// A stopped clock has no period, `0` is returned and rejected later on as
/// [`TimingError::ZeroBitPeriod`].
pub const fn bit_period_ns(spi_hz: u32) -> u32 {
    if spi_hz == 0 {
        return 0;
    }
    ((1_000_000_000u64 + spi_hz as u64 / 2) / spi_hz as u64) as u32
}

/// Target waveform of the led protocol together with the spi bit period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub bit_period_ns: u32,
    pub t0h_ns: u32,
    pub t1h_ns: u32,
    pub tolerance_ns: u32,
}

impl Timing {
    pub const fn new(bit_period_ns: u32, t1h_ns: u32, t0h_ns: u32) -> Self {
        Self {
            bit_period_ns,
            t0h_ns,
            t1h_ns,
            tolerance_ns: WS2812_TOLERANCE_NS,
        }
    }

    /// Nominal ws2812 timing for the given spi bit period
    pub const fn ws2812(bit_period_ns: u32) -> Self {
        Self::new(bit_period_ns, WS2812_T1H_NS, WS2812_T0H_NS)
    }

    /// Timing given as three phases: `t1` high for every bit, `t2` extra
    /// high for a one bit, `t3` low for every bit.
    ///
    /// `t3` only pads out the bit; the spi byte count fixes the period.
    pub const fn from_phases(bit_period_ns: u32, t1: u32, t2: u32, _t3: u32) -> Self {
        Self::new(bit_period_ns, t1 + t2, t1)
    }

    pub const fn with_tolerance(mut self, tolerance_ns: u32) -> Self {
        self.tolerance_ns = tolerance_ns;
        self
    }

    fn target_ns(&self, bit: Bit) -> u32 {
        match bit {
            Bit::Zero => self.t0h_ns,
            Bit::One => self.t1h_ns,
        }
    }

    /// Number of spi bits whose length is closest to the high time of `bit`
    fn nearest_bits(&self, bit: Bit) -> u32 {
        (self.target_ns(bit) + self.bit_period_ns / 2) / self.bit_period_ns
    }

    fn check_high_time(&self, bit: Bit, high_bits: u32) -> Result<(), TimingError> {
        let target_ns = self.target_ns(bit);
        let actual_ns = high_bits * self.bit_period_ns;
        if actual_ns.abs_diff(target_ns) > self.tolerance_ns {
            return Err(TimingError::OutOfTolerance {
                bit,
                actual_ns,
                target_ns,
                tolerance_ns: self.tolerance_ns,
            });
        }
        Ok(())
    }
}

/// The two patterns, indexed by the protocol bit they encode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PatternTable<const N: usize> {
    patterns: [[u8; N]; 2],
    idle_high: bool,
}

impl<const N: usize> PatternTable<N> {
    /// Use fixed patterns, e.g. values tuned on real hardware
    pub const fn from_patterns(one: [u8; N], zero: [u8; N]) -> Self {
        Self {
            patterns: [zero, one],
            idle_high: false,
        }
    }

    /// Compute the patterns for the given timing.
    ///
    /// Each bit gets the number of high spi bits closest to its target high
    /// time, kept between one bit and a pattern that still ends low. A one
    /// bit always gets more high bits than a zero bit. The configuration is
    /// rejected if the closest counts miss the tolerance, no other count
    /// would fit then either.
    pub fn derive(timing: &Timing) -> Result<Self, TimingError> {
        if N == 0 {
            return Err(TimingError::EmptyPattern);
        }
        if timing.bit_period_ns == 0 {
            return Err(TimingError::ZeroBitPeriod);
        }
        let last = Self::total_bits() - 1;
        let zero_high = timing.nearest_bits(Bit::Zero).clamp(1, last);
        // With zero_high == last, check() reports the patterns as equal
        let one_high = timing.nearest_bits(Bit::One).max(zero_high + 1).min(last);
        let table = Self::from_patterns(fill_high(one_high), fill_high(zero_high));
        table.check(timing)?;
        Ok(table)
    }

    /// The same table for an inverted data line: every pattern byte and the
    /// framing bytes are flipped, the line idles high.
    pub const fn inverted(self) -> Self {
        let mut patterns = self.patterns;
        let mut i = 0;
        while i < N {
            patterns[0][i] = !patterns[0][i];
            patterns[1][i] = !patterns[1][i];
            i += 1;
        }
        Self {
            patterns,
            idle_high: !self.idle_high,
        }
    }

    /// Byte that keeps the data line at its idle level
    pub const fn idle(&self) -> u8 {
        if self.idle_high {
            0xFF
        } else {
            0x00
        }
    }

    /// Verify the patterns against `timing`
    pub fn check(&self, timing: &Timing) -> Result<(), TimingError> {
        if N == 0 {
            return Err(TimingError::EmptyPattern);
        }
        if timing.bit_period_ns == 0 {
            return Err(TimingError::ZeroBitPeriod);
        }
        let total = Self::total_bits();
        let zero = self.high_bits(Bit::Zero);
        let one = self.high_bits(Bit::One);
        for (bit, high) in [(Bit::Zero, zero), (Bit::One, one)] {
            if high >= total {
                return Err(TimingError::NoLowPhase { bit, high, total });
            }
        }
        if one <= zero {
            return Err(TimingError::Indistinguishable { one, zero });
        }
        timing.check_high_time(Bit::Zero, zero)?;
        timing.check_high_time(Bit::One, one)?;
        Ok(())
    }

    /// Pattern for a single protocol bit, `bit` being 0 or 1
    #[inline(always)]
    pub fn pattern(&self, bit: u8) -> &[u8; N] {
        &self.patterns[(bit & 1) as usize]
    }

    pub fn one(&self) -> &[u8; N] {
        &self.patterns[1]
    }

    pub fn zero(&self) -> &[u8; N] {
        &self.patterns[0]
    }

    /// Shifted high time of the one and zero pattern
    pub fn high_times_ns(&self, bit_period_ns: u32) -> (u32, u32) {
        (
            self.high_bits(Bit::One) * bit_period_ns,
            self.high_bits(Bit::Zero) * bit_period_ns,
        )
    }

    /// Bits driving the line away from idle
    fn high_bits(&self, bit: Bit) -> u32 {
        let pattern = &self.patterns[bit as usize];
        if self.idle_high {
            pattern.iter().map(|b| b.count_zeros()).sum()
        } else {
            pattern.iter().map(|b| b.count_ones()).sum()
        }
    }

    const fn total_bits() -> u32 {
        (N * 8) as u32
    }
}

fn fill_high<const N: usize>(high: u32) -> [u8; N] {
    let mut pattern = [0u8; N];
    for i in 0..high as usize {
        pattern[i / 8] |= 0x80 >> (i % 8);
    }
    pattern
}

/// Idle bytes sent around the pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Framing {
    /// Sent before the data, avoids a glitch on the first rising edge
    pub leading: usize,
    /// Sent after the data, forces the line back to idle
    pub trailing: usize,
}

impl Framing {
    pub const fn len(&self) -> usize {
        self.leading + self.trailing
    }
}

/// Everything that depends on the spi hardware: patterns, the timing they
/// were made for and the framing bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile<const N: usize> {
    pub table: PatternTable<N>,
    pub timing: Timing,
    pub framing: Framing,
}

impl<const N: usize> Profile<N> {
    pub fn derive(timing: Timing, framing: Framing) -> Result<Self, TimingError> {
        Ok(Self {
            table: PatternTable::derive(&timing)?,
            timing,
            framing,
        })
    }

    pub fn validate(&self) -> Result<(), TimingError> {
        self.table.check(&self.timing)
    }

    /// Spi bytes needed for a single led
    pub const fn bytes_per_led() -> usize {
        crate::pixels::CHANNELS * 8 * N
    }

    /// Buffer size needed to drive `leds` leds
    pub const fn buffer_len(&self, leds: usize) -> usize {
        leds * Self::bytes_per_led() + self.framing.len()
    }
}

/// STM32F4 at 168 MHz with SPI1 divided by 16: 5.25 MHz, 190 ns per spi bit.
///
/// One spi byte per led bit. The patterns were tuned on WS2812B strips:
/// 1.14 µs / 0.38 µs high in a 1.52 µs bit.
pub const ONE_BYTE_190NS: Profile<1> = Profile {
    table: PatternTable::from_patterns([0xFC], [0xC0]),
    timing: Timing::new(190, 1_100, WS2812_T0H_NS),
    framing: Framing {
        leading: 1,
        trailing: 1,
    },
};

/// 20 MHz spi, 50 ns per spi bit, three spi bytes per led bit.
///
/// The one bit is held slightly longer than nominal, 850 ns.
pub const THREE_BYTE_50NS: Profile<3> = Profile {
    table: PatternTable::from_patterns([0xFF, 0xFF, 0x80], [0xFF, 0x00, 0x00]),
    timing: Timing::new(50, 850, WS2812_T0H_NS),
    framing: Framing {
        leading: 0,
        trailing: 1,
    },
};
