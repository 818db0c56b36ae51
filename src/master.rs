//! The AT master driver: receive interrupt entry point, configuration and reader.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Vec;

use crate::{
    framer::{Framer, LineMode},
    logging::{debug, error, trace},
    prefix::Prefixes,
    response::{Message, ResponseKind},
    serial::{DEFAULT_BAUD_RATE, SerialRx},
    status::StatusSink,
};

#[cfg(any(feature = "log", feature = "defmt", feature = "tracing"))]
use crate::logging::RX;

struct Inner<'p, S, const N: usize> {
    framer: Framer<N>,
    prefixes: Prefixes<'p>,
    status: S,
}

impl<S, const N: usize> Inner<'_, S, N> {
    /// Classifies and drains the message at the tail, handing every payload byte to `sink`.
    ///
    /// Returns the kind and the payload length.
    fn read<F>(&mut self, mut sink: F) -> (ResponseKind, usize)
    where
        F: FnMut(usize, u8),
    {
        if self.framer.pending() == 0 {
            return (ResponseKind::None, 0);
        }

        self.framer.consume();

        let mut kind = self.prefixes.classify(self.framer.ring());
        let mut len = 0;

        loop {
            match self.framer.ring_mut().take() {
                0 => break,
                byte => {
                    sink(len, byte);
                    len += 1;
                }
            }
        }

        if len == 0 {
            kind = ResponseKind::BlankLine;
        }

        debug!(
            target: RX,
            "Response: {:?}, length: {}, pending: {}",
            kind,
            len,
            self.framer.pending()
        );

        (kind, len)
    }
}

/// Frames and classifies AT responses received byte by byte from a serial interrupt.
///
/// All state sits behind a [`critical_section::Mutex`], every method takes `&self` so the
/// driver can be placed in a `static` and shared between the RX interrupt and the foreground.
///
/// `N` is the capacity of the receive ring buffer. It must hold every byte and one `\0` per
/// message that arrives before the foreground reads it, otherwise bytes are lost.
///
/// # Example
///
/// ```rust
/// use atframe::{AtMaster, ResponseKind, mock::MockRx, status::NoStatus};
///
/// static AT: AtMaster<'static, NoStatus, 128> = AtMaster::new(b"OK", b"ERROR", NoStatus);
///
/// let mut rx = MockRx::<32>::new();
/// AT.configure(&mut rx).ok();
///
/// rx.push(b"OK\r\n");
///
/// // Normally called from the UART RX interrupt.
/// while AT.on_rx_interrupt(&mut rx) {}
///
/// let mut line = [0u8; 32];
/// assert_eq!(AT.process(Some(&mut line)), ResponseKind::Ok);
/// assert_eq!(&line[..3], b"OK\0");
/// assert_eq!(AT.process(None), ResponseKind::None);
/// ```
pub struct AtMaster<'p, S, const N: usize> {
    inner: Mutex<RefCell<Inner<'p, S, N>>>,
}

impl<S, const N: usize> core::fmt::Debug for AtMaster<'_, S, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        critical_section::with(|cs| {
            let inner = self.inner.borrow_ref(cs);

            f.debug_struct("AtMaster")
                .field("framer", &inner.framer)
                .field("prefixes", &inner.prefixes)
                .finish_non_exhaustive()
        })
    }
}

impl<'p, S, const N: usize> AtMaster<'p, S, N> {
    /// Creates a new [`AtMaster`] classifying against `ok` and `error`.
    ///
    /// Starts in [`LineMode::Crlf`] with no init or custom prefix.
    #[inline]
    pub const fn new(ok: &'p [u8], error: &'p [u8], status: S) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                framer: Framer::new(),
                prefixes: Prefixes::new(ok, error),
                status,
            })),
        }
    }

    /// Runs `f` on the state inside a critical section. `f` must not reenter `self`.
    fn with<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Inner<'p, S, N>) -> T,
    {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Configures `rx` with [`DEFAULT_BAUD_RATE`].
    ///
    /// Afterwards the application routes the port's RX interrupt to [`on_rx_interrupt`](Self::on_rx_interrupt).
    pub fn configure<R>(&self, rx: &mut R) -> Result<(), R::Error>
    where
        R: SerialRx,
    {
        debug!(target: RX, "Configuring serial. baud: {}", DEFAULT_BAUD_RATE);

        rx.set_baud_rate(DEFAULT_BAUD_RATE)
    }

    /// RX interrupt handler. Reads at most one byte from `rx` and frames it.
    ///
    /// Returns `true` if a byte was consumed. Errors of `rx` are logged and swallowed.
    pub fn on_rx_interrupt<R>(&self, rx: &mut R) -> bool
    where
        R: SerialRx,
        S: StatusSink,
    {
        match rx.readable() {
            Ok(true) => {}
            Ok(false) => return false,
            Err(_err) => {
                error!(target: RX, "Failed to poll serial");

                return false;
            }
        }

        match rx.read_byte() {
            Ok(byte) => {
                self.on_byte(byte);

                true
            }
            Err(_err) => {
                error!(target: RX, "Failed to read byte");

                false
            }
        }
    }

    /// Frames one received byte.
    pub fn on_byte(&self, byte: u8)
    where
        S: StatusSink,
    {
        trace!(target: RX, "Byte received: {:?}", byte);

        self.with(|inner| inner.framer.on_byte(byte, &mut inner.status));
    }

    /// Sets the init prefix and arms it. The next message starting with it is reported as [`ResponseKind::Init`].
    pub fn set_init_prefix(&self, prefix: &'p [u8]) {
        self.with(|inner| inner.prefixes.set_init(prefix));
    }

    /// Sets the custom prefix. Messages starting with it are reported as [`ResponseKind::Custom`].
    pub fn set_custom_prefix(&self, prefix: &'p [u8]) {
        self.with(|inner| inner.prefixes.set_custom(prefix));
    }

    /// Removes the custom prefix.
    pub fn clear_custom_prefix(&self) {
        self.with(|inner| inner.prefixes.clear_custom());
    }

    /// Switches the framing mode.
    ///
    /// When switching into [`LineMode::Length`], an accumulated message that already holds
    /// [`expected_length`](Self::expected_length) bytes is framed immediately.
    pub fn set_line_mode(&self, mode: LineMode)
    where
        S: StatusSink,
    {
        self.with(|inner| inner.framer.set_mode(mode, &mut inner.status));
    }

    /// Sets the message length of [`LineMode::Length`].
    ///
    /// Set it before switching modes, or use [`set_length_mode`](Self::set_length_mode).
    pub fn set_expected_length(&self, length: usize) {
        self.with(|inner| inner.framer.set_expected_length(length));
    }

    /// Sets the expected length and switches into [`LineMode::Length`] in one critical section.
    pub fn set_length_mode(&self, length: usize)
    where
        S: StatusSink,
    {
        self.with(|inner| {
            inner.framer.set_expected_length(length);
            inner.framer.set_mode(LineMode::Length, &mut inner.status);
        });
    }

    /// Returns the current framing mode.
    pub fn line_mode(&self) -> LineMode {
        self.with(|inner| inner.framer.mode())
    }

    /// Returns the message length of [`LineMode::Length`].
    pub fn expected_length(&self) -> usize {
        self.with(|inner| inner.framer.expected_length())
    }

    /// Returns the number of framed messages waiting to be processed.
    pub fn pending(&self) -> u32 {
        self.with(|inner| inner.framer.pending())
    }

    /// Returns `true` if at least one framed message is waiting.
    pub fn has_data(&self) -> bool {
        self.pending() > 0
    }

    /// Returns `true` while the init prefix is armed.
    pub fn is_waiting_init(&self) -> bool {
        self.with(|inner| inner.prefixes.is_waiting_init())
    }

    /// Returns the number of bytes dropped because the ring buffer was full.
    pub fn dropped(&self) -> u32 {
        self.with(|inner| inner.framer.dropped())
    }

    /// Returns the number of bytes in the ring buffer, sentinels included.
    pub fn buffered(&self) -> usize {
        self.with(|inner| inner.framer.ring().len())
    }

    /// Discards every buffered byte and pending message.
    ///
    /// Recovers framing after the ring buffer overflowed.
    pub fn reset(&self) {
        debug!(target: RX, "Resetting receive state");

        self.with(|inner| inner.framer.reset());
    }

    /// Gives access to the status sink.
    ///
    /// `f` runs inside a critical section while the driver state is borrowed.
    ///
    /// # Panics
    ///
    /// Panics if `f` calls back into the same [`AtMaster`], e.g. `AT.pending()`, since the
    /// state is already borrowed.
    pub fn with_status<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut S) -> T,
    {
        self.with(|inner| f(&mut inner.status))
    }

    /// Classifies and removes the oldest pending message.
    ///
    /// If `dest` is given, the payload is copied into it followed by a `\0`. A payload that
    /// does not fit is truncated so the terminator always fits (given a non empty `dest`).
    ///
    /// Returns [`ResponseKind::None`] if no message is pending. Call it until it does to drain every message.
    pub fn process(&self, dest: Option<&mut [u8]>) -> ResponseKind {
        self.process_len(dest).0
    }

    /// Like [`process`](Self::process), also returning the payload length before truncation.
    pub fn process_len(&self, dest: Option<&mut [u8]>) -> (ResponseKind, usize) {
        match dest {
            None => self.with(|inner| inner.read(|_, _| {})),
            Some(dest) => {
                let capacity = dest.len().saturating_sub(1);

                let (kind, len) = self.with(|inner| {
                    inner.read(|index, byte| {
                        if index < capacity {
                            dest[index] = byte;
                        }
                    })
                });

                if let Some(terminator) = dest.get_mut(len.min(capacity)) {
                    *terminator = 0;
                }

                (kind, len)
            }
        }
    }

    /// Classifies and removes the oldest pending message, returning an owned copy.
    ///
    /// Payloads longer than `M` bytes are truncated, see [`Message::is_truncated`].
    /// Returns `None` if no message is pending.
    pub fn next_message<const M: usize>(&self) -> Option<Message<M>> {
        let mut payload = Vec::<u8, M>::new();

        let (kind, len) = self.with(|inner| {
            inner.read(|_, byte| {
                let _ = payload.push(byte);
            })
        });

        if len > payload.len() {
            debug!(target: RX, "Message truncated. length: {}, capacity: {}", len, M);
        }

        match kind {
            ResponseKind::None => None,
            kind => Some(Message { kind, payload, len }),
        }
    }
}

#[cfg(test)]
mod test {
    use std::vec::Vec;

    use crate::{mock::MockRx, status::NoStatus, tests::init_tracing};

    use super::*;

    fn master() -> AtMaster<'static, NoStatus, 128> {
        AtMaster::new(b"OK", b"ERROR", NoStatus)
    }

    fn feed<S: StatusSink, const N: usize>(master: &AtMaster<'_, S, N>, bytes: &[u8]) {
        for &byte in bytes {
            master.on_byte(byte);
        }
    }

    fn process(master: &AtMaster<'_, NoStatus, 128>) -> (ResponseKind, Vec<u8>) {
        let mut dest = [0xff_u8; 64];
        let (kind, len) = master.process_len(Some(&mut dest));

        assert_eq!(dest[len], 0, "payload must be null terminated");

        (kind, dest[..len].to_vec())
    }

    #[test]
    fn crlf_basic() {
        init_tracing();

        let master = master();
        feed(&master, b"OK\r\n");

        assert_eq!(master.pending(), 1);

        let mut dest = [0xff_u8; 8];
        assert_eq!(master.process(Some(&mut dest)), ResponseKind::Ok);
        assert_eq!(&dest[..3], b"OK\0");
        assert_eq!(master.pending(), 0);
        assert_eq!(master.process(None), ResponseKind::None);
    }

    #[test]
    fn blank_line() {
        init_tracing();

        let master = master();
        feed(&master, b"\r\n");

        let mut dest = [0xff_u8; 8];
        assert_eq!(master.process(Some(&mut dest)), ResponseKind::BlankLine);
        assert_eq!(dest[0], 0);
    }

    #[test]
    fn embedded_carriage_return() {
        init_tracing();

        let master = master();
        feed(&master, b"A\rB\r\n");

        assert_eq!(process(&master), (ResponseKind::Other, b"A\rB".to_vec()));
    }

    #[test]
    fn custom_match() {
        init_tracing();

        let master = master();
        master.set_custom_prefix(b"+CME");
        feed(&master, b"+CME ERROR: 10\r\n");

        assert_eq!(
            process(&master),
            (ResponseKind::Custom, b"+CME ERROR: 10".to_vec())
        );
    }

    #[test]
    fn error_match() {
        init_tracing();

        let master = master();
        feed(&master, b"ERROR\r\n");

        assert_eq!(process(&master), (ResponseKind::Error, b"ERROR".to_vec()));
    }

    #[test]
    fn length_mode_mid_stream() {
        init_tracing();

        let master = master();
        master.set_expected_length(5);
        master.set_line_mode(LineMode::Length);
        feed(&master, b"HELLO");

        assert_eq!(master.line_mode(), LineMode::Length);
        assert_eq!(process(&master), (ResponseKind::Other, b"HELLO".to_vec()));
    }

    #[test]
    fn late_close_on_mode_switch() {
        init_tracing();

        let master = master();
        feed(&master, b"HELLO");

        assert_eq!(master.pending(), 0);

        master.set_expected_length(5);
        master.set_line_mode(LineMode::Length);

        assert_eq!(master.pending(), 1);
        assert_eq!(process(&master), (ResponseKind::Other, b"HELLO".to_vec()));
    }

    #[test]
    fn reselecting_crlf_keeps_pending_terminator() {
        init_tracing();

        let master = master();
        feed(&master, b"OK\r");
        master.set_line_mode(LineMode::Crlf);
        feed(&master, b"\nERROR\r\n");

        assert_eq!(master.pending(), 2);
        assert_eq!(process(&master), (ResponseKind::Ok, b"OK".to_vec()));
        assert_eq!(process(&master), (ResponseKind::Error, b"ERROR".to_vec()));
    }

    #[test]
    fn length_mode_in_one_step() {
        init_tracing();

        let master = master();
        feed(&master, b"HELLO");
        master.set_length_mode(5);

        assert_eq!(master.expected_length(), 5);
        assert_eq!(master.pending(), 1);
    }

    #[test]
    fn expected_length_is_not_rearmed() {
        init_tracing();

        let master = master();
        master.set_length_mode(3);
        feed(&master, b"abcdefgh");

        assert_eq!(master.pending(), 2);
        assert_eq!(process(&master), (ResponseKind::Other, b"abc".to_vec()));
        assert_eq!(process(&master), (ResponseKind::Other, b"def".to_vec()));

        master.set_expected_length(4);
        feed(&master, b"ij");

        assert_eq!(process(&master), (ResponseKind::Other, b"ghij".to_vec()));
    }

    #[test]
    fn init_arming() {
        init_tracing();

        let master = master();
        master.set_init_prefix(b"READY");

        assert!(master.is_waiting_init());

        feed(&master, b"READY\r\nREADY\r\n");

        assert_eq!(master.process(None), ResponseKind::Init);
        assert!(!master.is_waiting_init());
        assert_eq!(master.process(None), ResponseKind::Other);
    }

    #[test]
    fn process_without_destination_matches_with_destination() {
        init_tracing();

        let first = master();
        let second = master();

        for master in [&first, &second] {
            feed(master, b"+CSQ: 20,99\r\nOK\r\n\r\nERROR\r\n");
        }

        let mut dest = [0_u8; 32];

        for _ in 0..4 {
            let pending = first.pending();

            assert_eq!(first.process(None), second.process(Some(&mut dest)));
            assert_eq!(first.pending(), pending - 1);
        }

        assert_eq!(first.process(None), ResponseKind::None);
        assert_eq!(second.process(Some(&mut dest)), ResponseKind::None);
    }

    #[test]
    fn draining_every_line_empties_the_buffer() {
        init_tracing();

        let master = master();
        let lines: &[&[u8]] = &[b"AT", b"OK", b"+CREG: 0,1", b"", b"ERROR"];

        for line in lines {
            feed(&master, line);
            feed(&master, b"\r\n");
        }

        assert_eq!(master.pending(), lines.len() as u32);

        let mut kinds = Vec::new();

        loop {
            match master.process(None) {
                ResponseKind::None => break,
                kind => kinds.push(kind),
            }
        }

        assert_eq!(
            kinds,
            [
                ResponseKind::Other,
                ResponseKind::Ok,
                ResponseKind::Other,
                ResponseKind::BlankLine,
                ResponseKind::Error,
            ]
        );
        assert_eq!(master.buffered(), 0);
    }

    #[test]
    fn short_destination_is_truncated_and_terminated() {
        init_tracing();

        let master = master();
        feed(&master, b"+CGMR: 1.2.3\r\nOK\r\n");

        let mut dest = [0xff_u8; 4];
        let (kind, len) = master.process_len(Some(&mut dest));

        assert_eq!(kind, ResponseKind::Other);
        assert_eq!(len, 12);
        assert_eq!(&dest, b"+CG\0");

        assert_eq!(master.process(Some(&mut [])), ResponseKind::Ok);
        assert_eq!(master.buffered(), 0);
    }

    #[test]
    fn next_message_returns_owned_payload() {
        init_tracing();

        let master = master();
        feed(&master, b"OK\r\n+CSQ: 31,99\r\n");

        let message = master.next_message::<32>().expect("Must be pending");
        assert_eq!(message.kind, ResponseKind::Ok);
        assert_eq!(message.as_str().expect("Must be utf8"), "OK");

        assert_eq!(message.len(), 2);
        assert!(!message.is_truncated());

        let message = master.next_message::<4>().expect("Must be pending");
        assert_eq!(message.kind, ResponseKind::Other);
        assert_eq!(message.payload.as_slice(), b"+CSQ");
        assert_eq!(message.len(), 11);
        assert!(message.is_truncated());

        assert!(master.next_message::<32>().is_none());
    }

    #[test]
    fn interrupt_reads_one_byte_per_call() {
        init_tracing();

        let master = master();
        let mut rx = MockRx::<32>::new();

        master.configure(&mut rx).expect("Must configure");
        assert_eq!(rx.baud(), Some(DEFAULT_BAUD_RATE));

        rx.push(b"OK\r\n");

        assert!(master.on_rx_interrupt(&mut rx));
        assert_eq!(rx.remaining(), 3);

        while master.on_rx_interrupt(&mut rx) {}

        assert_eq!(rx.remaining(), 0);
        assert_eq!(master.process(None), ResponseKind::Ok);
    }

    #[test]
    fn interrupt_swallows_serial_errors() {
        init_tracing();

        let master = master();
        let mut rx = MockRx::<32>::new();

        rx.push(b"OK\r\n");
        rx.fail_next();

        assert!(!master.on_rx_interrupt(&mut rx));

        while master.on_rx_interrupt(&mut rx) {}

        assert_eq!(master.process(None), ResponseKind::Ok);
    }

    #[test]
    fn overflow_is_counted_and_reset_recovers() {
        init_tracing();

        let master = AtMaster::<'static, NoStatus, 8>::new(b"OK", b"ERROR", NoStatus);
        feed(&master, b"+CGSN: 490154203237518\r\n");

        assert!(master.dropped() > 0);
        assert_eq!(master.buffered(), 8);

        master.reset();

        assert_eq!(master.pending(), 0);
        assert_eq!(master.buffered(), 0);

        feed(&master, b"OK\r\n");

        assert_eq!(master.process(None), ResponseKind::Ok);
    }

    #[test]
    fn status_sink_observes_events() {
        #[derive(Debug, Default)]
        struct Counts {
            bytes: usize,
            frames: usize,
            nuls: usize,
        }

        impl StatusSink for Counts {
            fn byte_received(&mut self) {
                self.bytes += 1;
            }

            fn frame_completed(&mut self) {
                self.frames += 1;
            }

            fn nul_received(&mut self) {
                self.nuls += 1;
            }
        }

        init_tracing();

        let master = AtMaster::<'static, Counts, 128>::new(b"OK", b"ERROR", Counts::default());
        feed(&master, b"OK\r\n\0\r\n");
        master.set_length_mode(0);

        let (bytes, frames, nuls) =
            master.with_status(|counts| (counts.bytes, counts.frames, counts.nuls));

        assert_eq!(bytes, 7);
        assert_eq!(frames, 3);
        assert_eq!(nuls, 1);
    }

    #[test]
    #[should_panic]
    fn reentering_from_status_closure_panics() {
        let master = master();

        master.with_status(|_| master.pending());
    }
}
