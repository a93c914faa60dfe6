//! Pixel streams feeding the encoder.
//!
//! The encoder only sees finished components: already scaled and already in
//! the order the leds expect them on the wire.

use smart_leds_trait::RGB8;

/// Color components per led
pub const CHANNELS: usize = 3;

/// Advance-only cursor over the pixels of a frame
pub trait PixelSource {
    /// Pixels left, the current one included
    fn len(&self) -> usize;

    /// Are at least `n` more pixels available
    fn has(&self, n: usize) -> bool {
        self.len() >= n
    }

    /// Components of the current pixel, in wire order
    fn load(&self) -> [u8; CHANNELS];

    fn advance(&mut self);
}

/// Order in which the color components are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ColorOrder {
    #[default]
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    #[inline]
    pub const fn arrange(self, c: RGB8) -> [u8; CHANNELS] {
        match self {
            ColorOrder::Rgb => [c.r, c.g, c.b],
            ColorOrder::Rbg => [c.r, c.b, c.g],
            ColorOrder::Grb => [c.g, c.r, c.b],
            ColorOrder::Gbr => [c.g, c.b, c.r],
            ColorOrder::Brg => [c.b, c.r, c.g],
            ColorOrder::Bgr => [c.b, c.g, c.r],
        }
    }
}

/// Scale `value` by `scale / 256`, with 255 leaving the value untouched
#[inline]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (scale as u16 + 1)) >> 8) as u8
}

/// Full brightness on every channel
pub const FULL_SCALE: RGB8 = RGB8 {
    r: 255,
    g: 255,
    b: 255,
};

#[inline]
fn scale_color(c: RGB8, scale: RGB8) -> RGB8 {
    RGB8 {
        r: scale8(c.r, scale.r),
        g: scale8(c.g, scale.g),
        b: scale8(c.b, scale.b),
    }
}

/// Pixels taken from a slice of colors
pub struct Pixels<'a> {
    colors: &'a [RGB8],
    order: ColorOrder,
    scale: RGB8,
}

impl<'a> Pixels<'a> {
    pub fn new(colors: &'a [RGB8], order: ColorOrder, scale: RGB8) -> Self {
        Self {
            colors,
            order,
            scale,
        }
    }
}

impl PixelSource for Pixels<'_> {
    fn len(&self) -> usize {
        self.colors.len()
    }

    fn load(&self) -> [u8; CHANNELS] {
        self.order
            .arrange(scale_color(self.colors[0], self.scale))
    }

    fn advance(&mut self) {
        self.colors = &self.colors[1..];
    }
}

/// The same color for `count` pixels
pub struct Solid {
    components: [u8; CHANNELS],
    remaining: usize,
}

impl Solid {
    pub fn new(color: RGB8, count: usize, order: ColorOrder, scale: RGB8) -> Self {
        Self {
            components: order.arrange(scale_color(color, scale)),
            remaining: count,
        }
    }
}

impl PixelSource for Solid {
    fn len(&self) -> usize {
        self.remaining
    }

    fn load(&self) -> [u8; CHANNELS] {
        self.components
    }

    fn advance(&mut self) {
        self.remaining -= 1;
    }
}
