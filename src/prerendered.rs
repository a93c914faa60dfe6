//! This prerenders the data, so that no calculations have to be performed while sending the data.
//!
//! The whole frame is encoded into a buffer and handed to the spi bus in one
//! write, which lets a dma backed bus generate the timing in hardware. This
//! approach minimizes timing issues, at the cost of much higher ram usage.

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorType, SpiBus};
use smart_leds_trait::{SmartLedsWrite, RGB8};

use crate::encoder::{self, FrameWriter};
use crate::error::{BufferTooSmall, Error};
use crate::pattern::Profile;
use crate::pixels::{ColorOrder, PixelSource, Pixels, Solid};
use crate::wait::{self, Clock, MinWait, DEFAULT_MIN_WAIT};
use crate::LedController;

/// Upper bound reported by `max_refresh_rate`
pub const MAX_REFRESH_RATE: u16 = 400;

/// Where the driver is in the show cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Idle,
    Encoding,
    Transmitting,
    /// The frame went out, the leds are latching
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub order: ColorOrder,
    /// Quiet time after every frame
    pub min_wait: Duration,
    /// Extra quiet time before the first frame after `init`
    pub startup_delay: Duration,
    /// Invert every byte sent, for an inverting level shifter or a data
    /// line that idles high. Framing bytes become `0xFF`.
    pub idle_high: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            order: ColorOrder::default(),
            min_wait: DEFAULT_MIN_WAIT,
            startup_delay: Duration::from_ticks(0),
            idle_high: false,
        }
    }
}

pub struct Ws2812<'a, SPI, CLK, D, const N: usize> {
    pub(crate) spi: SPI,
    pub(crate) clock: CLK,
    pub(crate) delay: D,
    pub(crate) profile: Profile<N>,
    pub(crate) config: Config,
    pub(crate) data: &'a mut [u8],
    pub(crate) capacity: usize,
    pub(crate) frame_len: usize,
    pub(crate) min_wait: MinWait,
    pub(crate) state: State,
}

impl<'a, SPI, CLK, D, const N: usize> Ws2812<'a, SPI, CLK, D, N>
where
    SPI: ErrorType,
    CLK: Clock,
{
    /// The SPI bus should run exactly at the bit period of `profile`
    ///
    /// You may need to look at the datasheet and your own hal to verify this.
    ///
    /// `data` holds the encoded frame, its length fixes the maximum number of
    /// leds. Use `profile.buffer_len(leds)` to size it.
    pub fn new(
        spi: SPI,
        clock: CLK,
        delay: D,
        profile: Profile<N>,
        config: Config,
        data: &'a mut [u8],
    ) -> Result<Self, Error<SPI::Error>> {
        if let Err(e) = profile.validate() {
            error!("rejecting pattern table: {}", e);
            return Err(e.into());
        }
        let profile = if config.idle_high {
            Profile {
                table: profile.table.inverted(),
                ..profile
            }
        } else {
            profile
        };
        let needed = profile.framing.len();
        if data.len() < needed {
            error!("buffer of {} bytes can't hold the framing", data.len());
            return Err(BufferTooSmall {
                len: data.len(),
                needed,
            }
            .into());
        }
        let capacity = (data.len() - needed) / Profile::<N>::bytes_per_led();
        debug!("ws2812 driver for up to {} leds, {} spi bytes per bit", capacity, N);
        Ok(Self {
            spi,
            clock,
            delay,
            profile,
            config,
            data,
            capacity,
            frame_len: 0,
            min_wait: MinWait::new(config.min_wait),
            state: State::Idle,
        })
    }
}

impl<'a, SPI, CLK, D, const N: usize> Ws2812<'a, SPI, CLK, D, N>
where
    CLK: Clock,
{
    /// Number of leds the buffer can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn state(&self) -> State {
        match self.state {
            State::Cooldown if self.min_wait.remaining(self.clock.now()).as_ticks() == 0 => {
                State::Idle
            }
            state => state,
        }
    }

    /// Bytes sent by the last transfer, framing included.
    ///
    /// Empty after a `SmartLedsWrite::write` that ran past the capacity while
    /// encoding: the buffer then holds part of a frame that was never sent.
    pub fn last_frame(&self) -> &[u8] {
        &self.data[..self.frame_len]
    }

    pub fn max_refresh_rate(&self) -> u16 {
        let frame_bits = self.profile.buffer_len(self.capacity) as u64 * 8;
        let frame_ns = frame_bits * self.profile.timing.bit_period_ns as u64
            + self.config.min_wait.as_micros() * 1_000;
        let rate = 1_000_000_000 / frame_ns.max(1);
        rate.min(MAX_REFRESH_RATE as u64) as u16
    }

    pub(crate) fn arm_startup(&mut self) {
        let now = self.clock.now();
        self.min_wait.hold(now, self.config.startup_delay);
        self.state = State::Cooldown;
    }

    pub(crate) fn check_capacity<E>(&self, requested: usize) -> Result<(), Error<E>> {
        if requested > self.capacity {
            warn!("{} leds requested, capacity is {}", requested, self.capacity);
            return Err(Error::Overrun {
                requested,
                capacity: self.capacity,
            });
        }
        Ok(())
    }

    /// Encode the frame and return the transfer length
    pub(crate) fn render<S: PixelSource>(
        &mut self,
        pixels: &mut S,
    ) -> Result<usize, BufferTooSmall> {
        self.state = State::Encoding;
        match encoder::encode(&self.profile.table, self.profile.framing, pixels, self.data) {
            Ok(content) => {
                self.frame_len = content + self.profile.framing.len();
                self.state = State::Transmitting;
                trace!("sending frame of {} bytes", self.frame_len);
                Ok(self.frame_len)
            }
            Err(e) => {
                self.state = State::Idle;
                Err(e)
            }
        }
    }

    pub(crate) fn complete<E>(&mut self, result: Result<(), E>) -> Result<(), Error<E>> {
        match result {
            Ok(()) => {
                let now = self.clock.now();
                self.min_wait.mark(now);
                self.state = State::Cooldown;
                Ok(())
            }
            Err(e) => {
                warn!("spi transfer failed, frame dropped");
                self.state = State::Idle;
                Err(Error::Spi(e))
            }
        }
    }
}

impl<'a, SPI, CLK, D, const N: usize> Ws2812<'a, SPI, CLK, D, N>
where
    SPI: SpiBus<u8>,
    CLK: Clock,
    D: DelayNs,
{
    /// Starts the driver, the first frame waits for the startup delay
    pub fn init(&mut self) -> Result<(), Error<SPI::Error>> {
        self.spi.flush().map_err(Error::Spi)?;
        self.arm_startup();
        debug!("ws2812 driver ready");
        Ok(())
    }

    /// Show `colors`, each channel scaled by `scale`
    pub fn show(&mut self, colors: &[RGB8], scale: RGB8) -> Result<(), Error<SPI::Error>> {
        self.show_pixels(Pixels::new(colors, self.config.order, scale))
    }

    /// Show `color` on the first `n_leds` leds
    pub fn show_color(
        &mut self,
        color: RGB8,
        n_leds: usize,
        scale: RGB8,
    ) -> Result<(), Error<SPI::Error>> {
        self.show_pixels(Solid::new(color, n_leds, self.config.order, scale))
    }

    /// Turn the first `n_leds` leds off
    pub fn clear(&mut self, n_leds: usize) -> Result<(), Error<SPI::Error>> {
        self.show_color(RGB8::default(), n_leds, RGB8::default())
    }

    /// Encode and send a whole frame.
    ///
    /// Returns once the bus is idle again, so the buffer is never rewritten
    /// while it's still being sent.
    pub fn show_pixels<S: PixelSource>(&mut self, mut pixels: S) -> Result<(), Error<SPI::Error>> {
        self.check_capacity(pixels.len())?;
        self.wait();
        let len = self.render(&mut pixels)?;
        let result = self.transmit(len);
        self.complete(result)
    }

    fn wait(&mut self) {
        loop {
            let remaining = self.min_wait.remaining(self.clock.now());
            if remaining.as_ticks() == 0 {
                break;
            }
            self.delay.delay_us(wait::sleep_us(remaining));
        }
    }

    fn transmit(&mut self, len: usize) -> Result<(), SPI::Error> {
        self.spi.write(&self.data[..len])?;
        self.spi.flush()
    }
}

impl<SPI, CLK, D, const N: usize> LedController for Ws2812<'_, SPI, CLK, D, N>
where
    SPI: SpiBus<u8>,
    CLK: Clock,
    D: DelayNs,
{
    type Error = Error<SPI::Error>;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ws2812::init(self)
    }

    fn show(&mut self, colors: &[RGB8], scale: RGB8) -> Result<(), Self::Error> {
        Ws2812::show(self, colors, scale)
    }

    fn show_color(&mut self, color: RGB8, n_leds: usize, scale: RGB8) -> Result<(), Self::Error> {
        Ws2812::show_color(self, color, n_leds, scale)
    }

    fn clear(&mut self, n_leds: usize) -> Result<(), Self::Error> {
        Ws2812::clear(self, n_leds)
    }

    fn max_refresh_rate(&self) -> u16 {
        Ws2812::max_refresh_rate(self)
    }
}

impl<SPI, CLK, D, const N: usize> SmartLedsWrite for Ws2812<'_, SPI, CLK, D, N>
where
    SPI: SpiBus<u8>,
    CLK: Clock,
    D: DelayNs,
{
    type Error = Error<SPI::Error>;
    type Color = RGB8;
    /// Write all the items of an iterator to a ws2812 strip
    ///
    /// Colors are sent at full scale in the configured order.
    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let mut iterator = iterator.into_iter();
        self.check_capacity(iterator.size_hint().0)?;
        self.wait();

        self.state = State::Encoding;
        let order = self.config.order;
        let mut writer = FrameWriter::new(&self.profile.table, self.profile.framing, self.data)?;
        let mut count = 0;
        while let Some(item) = iterator.next() {
            if count == self.capacity {
                // Nothing was sent, the partial frame is dropped
                self.frame_len = 0;
                self.state = State::Idle;
                let requested = count + 1 + iterator.size_hint().0;
                warn!("{} leds requested, capacity is {}", requested, self.capacity);
                return Err(Error::Overrun {
                    requested,
                    capacity: self.capacity,
                });
            }
            writer.push(order.arrange(item.into()))?;
            count += 1;
        }
        let content = writer.finish();
        self.frame_len = content + self.profile.framing.len();
        self.state = State::Transmitting;
        trace!("sending frame of {} bytes", self.frame_len);

        let result = self.transmit(self.frame_len);
        self.complete(result)
    }
}
