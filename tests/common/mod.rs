#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embassy_time::Instant;
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{ErrorKind, ErrorType, SpiBus};
use ws2812_spi_dma::Clock;

/// Simulated time in microseconds, shared by clock, delay and bus
#[derive(Clone, Default)]
pub struct SimTime(Rc<Cell<u64>>);

impl SimTime {
    pub fn now_us(&self) -> u64 {
        self.0.get()
    }

    pub fn advance_us(&self, us: u64) {
        self.0.set(self.0.get() + us);
    }
}

impl Clock for SimTime {
    fn now(&self) -> Instant {
        Instant::from_micros(self.0.get())
    }
}

pub struct SimDelay {
    pub time: SimTime,
    pub calls: Rc<Cell<usize>>,
}

impl SimDelay {
    pub fn new(time: &SimTime) -> Self {
        Self {
            time: time.clone(),
            calls: Rc::default(),
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.set(self.calls.get() + 1);
        self.time.advance_us(ns.div_ceil(1_000) as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.calls.set(self.calls.get() + 1);
        self.time.advance_us(us as u64);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

impl embedded_hal::spi::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// When the write started
    pub start_us: u64,
    /// When flush returned
    pub done_us: u64,
    pub bytes: Vec<u8>,
}

/// What the fake bus saw, shared with the test
#[derive(Clone, Default)]
pub struct BusLog {
    pub frames: Rc<RefCell<Vec<Frame>>>,
    pub fail_next: Rc<Cell<bool>>,
    pub busy: Rc<Cell<bool>>,
}

impl BusLog {
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.frames.borrow().len()
    }
}

/// Spi bus that records every write and takes `transfer_us` to send a frame
pub struct FakeSpi {
    pub log: BusLog,
    pub time: SimTime,
    pub transfer_us: u64,
}

impl FakeSpi {
    pub fn new(time: &SimTime) -> (Self, BusLog) {
        let log = BusLog::default();
        (
            Self {
                log: log.clone(),
                time: time.clone(),
                transfer_us: 0,
            },
            log,
        )
    }
}

impl ErrorType for FakeSpi {
    type Error = BusFault;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), BusFault> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), BusFault> {
        if self.log.fail_next.replace(false) {
            return Err(BusFault);
        }
        assert!(!self.log.busy.get(), "write while a transfer is in flight");
        self.log.busy.set(true);
        self.log.frames.borrow_mut().push(Frame {
            start_us: self.time.now_us(),
            done_us: self.time.now_us(),
            bytes: words.to_vec(),
        });
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), BusFault> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), BusFault> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BusFault> {
        if self.log.busy.replace(false) {
            self.time.advance_us(self.transfer_us);
            if let Some(frame) = self.log.frames.borrow_mut().last_mut() {
                frame.done_us = self.time.now_us();
            }
        }
        Ok(())
    }
}

/// Turn an encoded frame back into component bytes
pub fn decode(content: &[u8], one: &[u8], zero: &[u8]) -> Vec<u8> {
    let n = one.len();
    content
        .chunks_exact(8 * n)
        .map(|byte| {
            byte.chunks_exact(n).fold(0u8, |acc, pattern| {
                let bit = if pattern == one {
                    1
                } else if pattern == zero {
                    0
                } else {
                    panic!("unknown pattern {pattern:x?}")
                };
                (acc << 1) | bit
            })
        })
        .collect()
}
