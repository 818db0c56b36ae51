//! Per-byte framing state machine.
//!
//! Bytes of a message are committed to the [`RingBuffer`] as they arrive. Once a message
//! is complete a single `\0` sentinel is appended and the pending counter is bumped.

use crate::{
    logging::{debug, trace, warn},
    ring::RingBuffer,
    status::StatusSink,
};

#[cfg(any(feature = "log", feature = "defmt", feature = "tracing"))]
use crate::logging::RX;

/// How the end of a message is recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineMode {
    /// Messages end with `\r\n`.
    #[default]
    Crlf,
    /// Messages end with `\n`.
    Lf,
    /// Messages are exactly [`Framer::expected_length`] bytes long.
    Length,
}

/// Framing state owned by the driver.
#[derive(Debug, Clone)]
pub struct Framer<const N: usize> {
    ring: RingBuffer<N>,
    mode: LineMode,
    /// Bytes of the message currently being accumulated.
    partial: usize,
    /// Complete messages waiting in the ring buffer.
    pending: u32,
    /// Previous byte, only used in [`LineMode::Crlf`].
    last: u8,
    expected_length: usize,
    dropped: u32,
}

impl<const N: usize> Framer<N> {
    /// Creates a new [`Framer`] in [`LineMode::Crlf`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            mode: LineMode::Crlf,
            partial: 0,
            pending: 0,
            last: 0,
            expected_length: 0,
            dropped: 0,
        }
    }

    /// Returns the current framing mode.
    #[inline]
    pub const fn mode(&self) -> LineMode {
        self.mode
    }

    /// Returns the message length used in [`LineMode::Length`].
    #[inline]
    pub const fn expected_length(&self) -> usize {
        self.expected_length
    }

    /// Sets the message length used in [`LineMode::Length`].
    ///
    /// Must be set before switching into [`LineMode::Length`] for the switch to close
    /// an already accumulated message. It stays in effect for every following message.
    #[inline]
    pub fn set_expected_length(&mut self, length: usize) {
        self.expected_length = length;
    }

    /// Returns the number of framed messages waiting to be read.
    #[inline]
    pub const fn pending(&self) -> u32 {
        self.pending
    }

    /// Returns the number of bytes of the message being accumulated.
    #[inline]
    pub const fn partial(&self) -> usize {
        self.partial
    }

    /// Returns the number of bytes lost because the ring buffer was full.
    #[inline]
    pub const fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Returns the ring buffer.
    #[inline]
    pub const fn ring(&self) -> &RingBuffer<N> {
        &self.ring
    }

    /// Returns the ring buffer mutably.
    #[inline]
    pub fn ring_mut(&mut self) -> &mut RingBuffer<N> {
        &mut self.ring
    }

    /// Switches the framing mode.
    ///
    /// Switching into [`LineMode::Length`] closes the accumulated message right away if
    /// it already holds [`expected_length`](Self::expected_length) bytes. The last received
    /// byte is kept, so a `\r` waiting for its `\n` survives re-selecting [`LineMode::Crlf`].
    pub fn set_mode<S>(&mut self, mode: LineMode, status: &mut S)
    where
        S: StatusSink,
    {
        debug!(target: RX, "Line mode: {:?} -> {:?}", self.mode, mode);

        self.mode = mode;

        if mode == LineMode::Length && self.partial >= self.expected_length {
            trace!(target: RX, "Closing accumulated message on mode switch");

            self.close(status);
        }
    }

    /// Feeds one received byte.
    pub fn on_byte<S>(&mut self, byte: u8, status: &mut S)
    where
        S: StatusSink,
    {
        status.byte_received();

        if byte == 0 {
            status.nul_received();
        }

        match self.mode {
            LineMode::Crlf => {
                match byte {
                    b'\r' => {
                        // A deferred '\r' followed by another '\r' was data.
                        if self.last == b'\r' {
                            self.commit(b'\r');
                        }
                    }
                    b'\n' if self.last == b'\r' => self.close(status),
                    _ => {
                        if self.last == b'\r' {
                            self.commit(b'\r');
                        }

                        self.commit(byte);
                    }
                }

                self.last = byte;
            }
            LineMode::Lf => match byte {
                b'\n' => self.close(status),
                _ => self.commit(byte),
            },
            LineMode::Length => {
                self.commit(byte);

                if self.partial >= self.expected_length {
                    self.close(status);
                }
            }
        }
    }

    /// Marks the end of a message that was taken out of the ring buffer.
    #[inline]
    pub fn consume(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    /// Discards buffered bytes, pending messages and the partial message.
    ///
    /// Mode, expected length and the dropped counter are kept.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.partial = 0;
        self.pending = 0;
        self.last = 0;
    }

    fn commit(&mut self, byte: u8) {
        self.store(byte);
        self.partial += 1;
    }

    fn close<S>(&mut self, status: &mut S)
    where
        S: StatusSink,
    {
        self.store(0);
        self.pending = self.pending.saturating_add(1);

        trace!(
            target: RX,
            "Message framed. length: {}, pending: {}",
            self.partial,
            self.pending
        );

        self.partial = 0;

        status.frame_completed();
    }

    fn store(&mut self, byte: u8) {
        if !self.ring.put(byte) {
            self.dropped = self.dropped.saturating_add(1);

            warn!(target: RX, "Ring buffer full, byte dropped. dropped: {}", self.dropped);
        }
    }
}

impl<const N: usize> Default for Framer<N> {
    fn default() -> Self {
        Self::new()
    }
}
