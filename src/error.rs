use thiserror::Error;

/// Which of the two protocol bits a timing problem refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bit {
    Zero = 0,
    One = 1,
}

/// A pattern table that cannot reproduce the requested waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimingError {
    #[error("spi bit period must be non-zero")]
    ZeroBitPeriod,
    #[error("a pattern needs at least one byte")]
    EmptyPattern,
    #[error("one pattern ({one} high bits) is not longer than zero pattern ({zero} high bits)")]
    Indistinguishable { one: u32, zero: u32 },
    #[error("{bit:?} pattern has {high} of {total} bits high and never returns low")]
    NoLowPhase { bit: Bit, high: u32, total: u32 },
    #[error("{bit:?} pattern is high for {actual_ns} ns, target {target_ns} ns +/- {tolerance_ns} ns")]
    OutOfTolerance {
        bit: Bit,
        actual_ns: u32,
        target_ns: u32,
        tolerance_ns: u32,
    },
}

/// An output buffer too short for the frame written into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("buffer of {len} bytes is too small, need at least {needed}")]
pub struct BufferTooSmall {
    pub len: usize,
    pub needed: usize,
}

/// Errors reported by the driver, `E` being the spi bus error
#[derive(Debug, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    #[error("invalid pattern timing: {0}")]
    Timing(#[from] TimingError),
    #[error(transparent)]
    BufferTooSmall(#[from] BufferTooSmall),
    /// More leds were requested than the buffer was sized for
    #[error("{requested} leds requested, buffer holds {capacity}")]
    Overrun { requested: usize, capacity: usize },
    /// The spi bus reported a failure, the frame was not retried
    #[error("spi transfer failed")]
    Spi(E),
}
