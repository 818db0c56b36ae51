//! Receive side of the serial collaborator.

use embedded_io::{ErrorType, Read, ReadReady};

/// Baud rate the driver configures the serial port with.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// The receive half of a serial port, as seen from the RX interrupt.
pub trait SerialRx: ErrorType {
    /// Configures the port for `baud` 8N1.
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error>;

    /// Returns `true` if a byte can be read without blocking.
    fn readable(&mut self) -> Result<bool, Self::Error>;

    /// Reads one byte. Only called after [`readable`](SerialRx::readable) returned `true`.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

impl<T> SerialRx for &mut T
where
    T: SerialRx,
{
    fn set_baud_rate(&mut self, baud: u32) -> Result<(), Self::Error> {
        (*self).set_baud_rate(baud)
    }

    fn readable(&mut self) -> Result<bool, Self::Error> {
        (*self).readable()
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        (*self).read_byte()
    }
}

/// Adapts an [`embedded_io`] reader into a [`SerialRx`].
///
/// The baud rate is left to whatever constructed the reader, [`SerialRx::set_baud_rate`] is a no-op.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IoRx<R> {
    inner: R,
}

impl<R> IoRx<R> {
    /// Creates a new [`IoRx`].
    #[inline]
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns reference to the reader.
    #[inline]
    pub const fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns mutable reference to the reader.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consumes the [`IoRx`] and returns the reader.
    #[inline]
    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Error returned by [`IoRx`].
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoRxError<E> {
    /// The underlying reader failed.
    IO(E),
    /// The reader reported ready but returned no byte.
    Eof,
}

impl<E> core::fmt::Display for IoRxError<E>
where
    E: core::fmt::Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IO(err) => write!(f, "IO error: {err}"),
            Self::Eof => write!(f, "EOF"),
        }
    }
}

impl<E> core::error::Error for IoRxError<E> where E: core::fmt::Display + core::fmt::Debug {}

impl<E> embedded_io::Error for IoRxError<E>
where
    E: embedded_io::Error,
{
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::IO(err) => err.kind(),
            Self::Eof => embedded_io::ErrorKind::Other,
        }
    }
}

impl<R> ErrorType for IoRx<R>
where
    R: ErrorType,
{
    type Error = IoRxError<R::Error>;
}

impl<R> SerialRx for IoRx<R>
where
    R: Read + ReadReady,
{
    fn set_baud_rate(&mut self, _baud: u32) -> Result<(), Self::Error> {
        Ok(())
    }

    fn readable(&mut self) -> Result<bool, Self::Error> {
        self.inner.read_ready().map_err(IoRxError::IO)
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut byte = [0_u8; 1];

        match self.inner.read(&mut byte) {
            Ok(0) => Err(IoRxError::Eof),
            Ok(_) => Ok(byte[0]),
            Err(err) => Err(IoRxError::IO(err)),
        }
    }
}

#[cfg(test)]
mod test {
    use embedded_io::{Error as _, ErrorKind};

    use crate::{
        AtMaster, ResponseKind,
        mock::{MockError, MockReader},
        status::NoStatus,
        tests::init_tracing,
    };

    use super::*;

    fn master() -> AtMaster<'static, NoStatus, 64> {
        AtMaster::new(b"OK", b"ERROR", NoStatus)
    }

    #[test]
    fn not_ready_reader_is_left_alone() {
        init_tracing();

        let master = master();
        let mut rx = IoRx::new(MockReader::<16>::new());

        assert!(!rx.readable().expect("Must poll"));
        assert!(!master.on_rx_interrupt(&mut rx));
        assert_eq!(master.buffered(), 0);
    }

    #[test]
    fn ready_reader_is_framed_one_byte_per_interrupt() {
        init_tracing();

        let master = master();
        let mut rx = IoRx::new(MockReader::<16>::new());

        master.configure(&mut rx).expect("Must configure");

        rx.inner_mut().push(b"OK\r\nERROR\r\n");

        assert!(master.on_rx_interrupt(&mut rx));
        assert_eq!(rx.inner().remaining(), 10);

        while master.on_rx_interrupt(&mut rx) {}

        assert_eq!(rx.inner().remaining(), 0);
        assert_eq!(master.process(None), ResponseKind::Ok);
        assert_eq!(master.process(None), ResponseKind::Error);
        assert_eq!(master.process(None), ResponseKind::None);
    }

    #[test]
    fn empty_read_is_eof() {
        init_tracing();

        let master = master();
        let mut rx = IoRx::new(MockReader::<16>::new());

        rx.inner_mut().eof();
        assert!(!master.on_rx_interrupt(&mut rx));

        rx.inner_mut().eof();
        assert!(rx.readable().expect("Must poll"));

        let err = rx.read_byte().expect_err("Must be eof");
        assert!(matches!(err, IoRxError::Eof));
        assert_eq!(err.kind(), ErrorKind::Other);

        assert_eq!(master.buffered(), 0);
    }

    #[test]
    fn reader_errors_are_mapped_and_swallowed() {
        init_tracing();

        let master = master();
        let mut rx = IoRx::new(MockReader::<16>::new());

        rx.inner_mut().push(b"OK\r\n");

        rx.inner_mut().fail_ready();
        assert!(!master.on_rx_interrupt(&mut rx));
        assert_eq!(rx.inner().remaining(), 4);

        rx.inner_mut().fail_read();
        assert!(!master.on_rx_interrupt(&mut rx));
        assert_eq!(rx.inner().remaining(), 4);

        rx.inner_mut().fail_read();
        assert!(matches!(rx.read_byte(), Err(IoRxError::IO(MockError))));

        rx.inner_mut().fail_ready();
        assert!(matches!(rx.readable(), Err(IoRxError::IO(MockError))));

        while master.on_rx_interrupt(&mut rx) {}

        assert_eq!(master.process(None), ResponseKind::Ok);

        let reader = rx.into_inner();
        assert_eq!(reader.remaining(), 0);
    }
}
