//! # Use ws2812 leds via spi and dma
//!
//! - For usage with `smart-leds`
//! - Implements the `SmartLedsWrite` trait
//! - Implements [`LedController`], a small controller interface drivers can
//!   be called through without knowing the concrete type
//!
//! Needs a type implementing the `embedded_hal::spi::SpiBus` trait, ideally
//! one backed by dma.
//!
//! Every bit for the leds is replaced by a fixed pattern of `N` spi bytes,
//! see [`pattern`]. The whole frame is prerendered into a buffer and sent in a
//! single transfer, so the spi hardware generates the timing and interrupts
//! can stay enabled. Between two frames the driver waits for the leds to
//! latch, see [`wait`].
//!
//! The spi peripheral has to run at exactly the bit period of the
//! [`pattern::Profile`] in use.
//!
//! ## Features
//!
//! - `async`: async driver methods on top of `embedded-hal-async`
//! - `defmt`: log through `defmt` and implement `defmt::Format` for the public types

// Timings for ws2812 from https://cpldcpu.files.wordpress.com/2014/01/ws2812_timing_table.png

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "async")]
pub mod asynch;
pub mod encoder;
pub mod error;
pub mod pattern;
pub mod pixels;
pub mod prerendered;
pub mod wait;

use embedded_hal::spi::{Mode, Phase, Polarity};
use smart_leds_trait::RGB8;

pub use error::{BufferTooSmall, Error, TimingError};
pub use pattern::{Framing, PatternTable, Profile, Timing, ONE_BYTE_190NS, THREE_BYTE_50NS};
pub use pixels::{ColorOrder, PixelSource};
pub use prerendered::{Config, State, Ws2812};
pub use wait::{Clock, SystemClock};

/// SPI mode that can be used for this crate
///
/// Provided for convenience
/// Doesn't really matter
pub const MODE: Mode = Mode {
    polarity: Polarity::IdleLow,
    phase: Phase::CaptureOnFirstTransition,
};

/// Led strip driver as seen by the code deciding what to show
///
/// Object safe, so drivers for different protocols or hardware can sit
/// behind `&mut dyn LedController<Error = E>`.
pub trait LedController {
    type Error;

    fn init(&mut self) -> Result<(), Self::Error>;

    /// Show `colors`, every channel scaled by the matching channel of `scale`
    fn show(&mut self, colors: &[RGB8], scale: RGB8) -> Result<(), Self::Error>;

    /// Show one color on the first `n_leds` leds
    fn show_color(&mut self, color: RGB8, n_leds: usize, scale: RGB8) -> Result<(), Self::Error>;

    /// Turn the first `n_leds` leds off
    fn clear(&mut self, n_leds: usize) -> Result<(), Self::Error> {
        self.show_color(RGB8::default(), n_leds, RGB8::default())
    }

    /// Highest frame rate the driver can sustain, informational only
    fn max_refresh_rate(&self) -> u16;
}
