//! Scripted serial receiver for testing purposes.

use heapless::Deque;

use crate::serial::SerialRx;

#[derive(Debug)]
pub struct MockError;

impl core::fmt::Display for MockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "mock error")
    }
}

impl embedded_io::Error for MockError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Hands out queued bytes one at a time, like a UART data register.
#[derive(Debug)]
pub struct MockRx<const N: usize> {
    queue: Deque<u8, N>,
    baud: Option<u32>,
    fail_next: bool,
}

impl<const N: usize> MockRx<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            baud: None,
            fail_next: false,
        }
    }

    /// Queues `bytes`, returns how many did not fit.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let mut rejected = 0;

        for &byte in bytes {
            if self.queue.push_back(byte).is_err() {
                rejected += 1;
            }
        }

        rejected
    }

    /// Makes the next [`SerialRx::read_byte`] fail.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }

    pub fn baud(&self) -> Option<u32> {
        self.baud
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl<const N: usize> Default for MockRx<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> embedded_io::ErrorType for MockRx<N> {
    type Error = MockError;
}

impl<const N: usize> SerialRx for MockRx<N> {
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error> {
        self.baud = Some(baud);

        Ok(())
    }

    fn readable(&mut self) -> Result<bool, Self::Error> {
        Ok(self.fail_next || !self.queue.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        if self.fail_next {
            self.fail_next = false;

            return Err(MockError);
        }

        self.queue.pop_front().ok_or(MockError)
    }
}

/// An [`embedded_io`] reader over queued bytes, for driving [`IoRx`](crate::serial::IoRx).
#[derive(Debug)]
pub struct MockReader<const N: usize> {
    queue: Deque<u8, N>,
    fail_ready: bool,
    fail_read: bool,
    eof: bool,
}

impl<const N: usize> MockReader<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            fail_ready: false,
            fail_read: false,
            eof: false,
        }
    }

    /// Queues `bytes`, returns how many did not fit.
    pub fn push(&mut self, bytes: &[u8]) -> usize {
        let mut rejected = 0;

        for &byte in bytes {
            if self.queue.push_back(byte).is_err() {
                rejected += 1;
            }
        }

        rejected
    }

    /// Makes the next [`ReadReady::read_ready`](embedded_io::ReadReady::read_ready) fail.
    pub fn fail_ready(&mut self) {
        self.fail_ready = true;
    }

    /// Makes the next [`Read::read`](embedded_io::Read::read) fail.
    pub fn fail_read(&mut self) {
        self.fail_read = true;
    }

    /// Makes the next [`Read::read`](embedded_io::Read::read) report end of file while claiming readiness.
    pub fn eof(&mut self) {
        self.eof = true;
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl<const N: usize> Default for MockReader<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> embedded_io::ErrorType for MockReader<N> {
    type Error = MockError;
}

impl<const N: usize> embedded_io::ReadReady for MockReader<N> {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        if self.fail_ready {
            self.fail_ready = false;

            return Err(MockError);
        }

        Ok(self.fail_read || self.eof || !self.queue.is_empty())
    }
}

impl<const N: usize> embedded_io::Read for MockReader<N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_read {
            self.fail_read = false;

            return Err(MockError);
        }

        if self.eof {
            self.eof = false;

            return Ok(0);
        }

        let mut read = 0;

        for slot in buf.iter_mut() {
            match self.queue.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    read += 1;
                }
                None => break,
            }
        }

        Ok(read)
    }
}
