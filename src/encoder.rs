//! Expands color components into spi patterns.
//!
//! Every component bit, most significant first, is replaced by the one or
//! zero pattern of the table. Nothing is computed while sending, the whole
//! frame sits in the buffer before the transfer starts.

use crate::error::BufferTooSmall;
use crate::pattern::{Framing, PatternTable, Profile};
use crate::pixels::{PixelSource, CHANNELS};

/// Writes a single frame into a buffer.
///
/// Framing bytes carry the idle level of the table. Room for the trailing
/// framing is kept free until [`FrameWriter::finish`].
pub struct FrameWriter<'t, 'b, const N: usize> {
    table: &'t PatternTable<N>,
    framing: Framing,
    buffer: &'b mut [u8],
    index: usize,
}

impl<'t, 'b, const N: usize> FrameWriter<'t, 'b, N> {
    /// Starts a frame, writing the leading framing bytes
    pub fn new(
        table: &'t PatternTable<N>,
        framing: Framing,
        buffer: &'b mut [u8],
    ) -> Result<Self, BufferTooSmall> {
        if buffer.len() < framing.len() {
            return Err(BufferTooSmall {
                len: buffer.len(),
                needed: framing.len(),
            });
        }
        buffer[..framing.leading].fill(table.idle());
        Ok(Self {
            table,
            framing,
            buffer,
            index: framing.leading,
        })
    }

    #[inline(always)]
    fn write_byte(&mut self, mut data: u8) {
        let out = &mut self.buffer[self.index..self.index + 8 * N];
        for chunk in out.chunks_exact_mut(N) {
            chunk.copy_from_slice(self.table.pattern(data >> 7));
            data <<= 1;
        }
        self.index += 8 * N;
    }

    /// Append one pixel, nothing is written if it doesn't fit
    #[inline]
    pub fn push(&mut self, components: [u8; CHANNELS]) -> Result<(), BufferTooSmall> {
        let needed = self.index + Profile::<N>::bytes_per_led() + self.framing.trailing;
        if needed > self.buffer.len() {
            return Err(BufferTooSmall {
                len: self.buffer.len(),
                needed,
            });
        }
        for c in components {
            self.write_byte(c);
        }
        Ok(())
    }

    /// Pixel bytes written so far, framing excluded
    pub fn content_len(&self) -> usize {
        self.index - self.framing.leading
    }

    /// Ends the frame with the trailing framing bytes.
    ///
    /// Returns the number of pixel bytes, framing excluded.
    pub fn finish(self) -> usize {
        let content = self.content_len();
        self.buffer[self.index..self.index + self.framing.trailing].fill(self.table.idle());
        content
    }
}

/// Encode every pixel of `pixels` into `buffer`, returning the pixel bytes
/// written. The transfer is that plus `framing.len()` bytes long.
///
/// `buffer` is left untouched if the whole frame doesn't fit.
pub fn encode<const N: usize, S: PixelSource>(
    table: &PatternTable<N>,
    framing: Framing,
    pixels: &mut S,
    buffer: &mut [u8],
) -> Result<usize, BufferTooSmall> {
    let needed = pixels.len() * Profile::<N>::bytes_per_led() + framing.len();
    if buffer.len() < needed {
        return Err(BufferTooSmall {
            len: buffer.len(),
            needed,
        });
    }
    let mut writer = FrameWriter::new(table, framing, buffer)?;
    while pixels.has(1) {
        writer.push(pixels.load())?;
        pixels.advance();
    }
    Ok(writer.finish())
}
