/// An error that can occur while writing to the serial port.
#[non_exhaustive]
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError<I, E> {
    /// An IO error occurred while writing to the underlying sink.
    IO(I),
    /// An error occurred while encoding a command.
    Encode(E),
}

impl<I, E> core::fmt::Display for WriteError<I, E>
where
    I: core::fmt::Display,
    E: core::fmt::Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IO(err) => write!(f, "IO error: {err}"),
            Self::Encode(err) => write!(f, "Encode error: {err}"),
        }
    }
}

impl<I, E> core::error::Error for WriteError<I, E>
where
    I: core::fmt::Display + core::fmt::Debug,
    E: core::fmt::Display + core::fmt::Debug,
{
}
