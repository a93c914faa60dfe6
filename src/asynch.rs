//! Async flavour of the prerendered driver.
//!
//! Same encoding and state handling as the blocking methods, but the wait
//! between frames and the transfer are awaited, so other tasks keep running
//! while the leds latch.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiBus;
use smart_leds_trait::RGB8;

use crate::error::Error;
use crate::pixels::{PixelSource, Pixels, Solid};
use crate::prerendered::Ws2812;
use crate::wait::{self, Clock};

impl<SPI, CLK, D, const N: usize> Ws2812<'_, SPI, CLK, D, N>
where
    SPI: SpiBus<u8>,
    CLK: Clock,
    D: DelayNs,
{
    pub async fn init_async(&mut self) -> Result<(), Error<SPI::Error>> {
        self.spi.flush().await.map_err(Error::Spi)?;
        self.arm_startup();
        debug!("ws2812 driver ready");
        Ok(())
    }

    pub async fn show_async(
        &mut self,
        colors: &[RGB8],
        scale: RGB8,
    ) -> Result<(), Error<SPI::Error>> {
        let pixels = Pixels::new(colors, self.config.order, scale);
        self.show_pixels_async(pixels).await
    }

    pub async fn show_color_async(
        &mut self,
        color: RGB8,
        n_leds: usize,
        scale: RGB8,
    ) -> Result<(), Error<SPI::Error>> {
        let pixels = Solid::new(color, n_leds, self.config.order, scale);
        self.show_pixels_async(pixels).await
    }

    pub async fn clear_async(&mut self, n_leds: usize) -> Result<(), Error<SPI::Error>> {
        self.show_color_async(RGB8::default(), n_leds, RGB8::default())
            .await
    }

    /// Encode and send a whole frame, resolving once the bus is idle again
    pub async fn show_pixels_async<S: PixelSource>(
        &mut self,
        mut pixels: S,
    ) -> Result<(), Error<SPI::Error>> {
        self.check_capacity(pixels.len())?;
        self.wait_async().await;
        let len = self.render(&mut pixels)?;
        let result = self.transmit_async(len).await;
        self.complete(result)
    }

    async fn wait_async(&mut self) {
        loop {
            let remaining = self.min_wait.remaining(self.clock.now());
            if remaining.as_ticks() == 0 {
                break;
            }
            self.delay.delay_us(wait::sleep_us(remaining)).await;
        }
    }

    async fn transmit_async(&mut self, len: usize) -> Result<(), SPI::Error> {
        self.spi.write(&self.data[..len]).await?;
        self.spi.flush().await
    }
}
