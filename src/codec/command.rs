//! AT command line encoder.

use crate::encode::Encoder;

/// Line terminator appended to every command by default.
pub const CRLF: &[u8] = b"\r\n";

/// Encodes a command by appending a line terminator.
///
/// The terminator defaults to `\r\n`. Modems that expect the bare `S3` character can use `\r`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command<'a> {
    terminator: &'a [u8],
}

impl<'a> Command<'a> {
    /// Creates a new [`Command`] terminated by `\r\n`.
    #[inline]
    pub const fn new() -> Self {
        Self::with_terminator(CRLF)
    }

    /// Creates a new [`Command`] with the given `terminator`.
    #[inline]
    pub const fn with_terminator(terminator: &'a [u8]) -> Self {
        Self { terminator }
    }

    /// Returns the line terminator.
    #[inline]
    pub const fn terminator(&self) -> &'a [u8] {
        self.terminator
    }
}

impl Default for Command<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned by [`Command::encode`].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandEncodeError {
    /// The output buffer is too small to fit the command and its terminator.
    BufferTooSmall,
}

impl core::fmt::Display for CommandEncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

impl core::error::Error for CommandEncodeError {}

impl Encoder<&[u8]> for Command<'_> {
    type Error = CommandEncodeError;

    fn encode(&mut self, item: &[u8], dst: &mut [u8]) -> Result<usize, Self::Error> {
        let size = item.len() + self.terminator.len();

        if dst.len() < size {
            return Err(CommandEncodeError::BufferTooSmall);
        }

        dst[..item.len()].copy_from_slice(item);
        dst[item.len()..size].copy_from_slice(self.terminator);

        Ok(size)
    }
}

impl Encoder<&str> for Command<'_> {
    type Error = CommandEncodeError;

    fn encode(&mut self, item: &str, dst: &mut [u8]) -> Result<usize, Self::Error> {
        Encoder::<&[u8]>::encode(self, item.as_bytes(), dst)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn appends_crlf() {
        let mut dst = [0_u8; 16];
        let size = Command::new()
            .encode("AT+CSQ", &mut dst)
            .expect("Must fit");

        assert_eq!(&dst[..size], b"AT+CSQ\r\n");
    }

    #[test]
    fn custom_terminator() {
        let mut dst = [0_u8; 4];
        let size = Command::with_terminator(b"\r")
            .encode(&b"ATE0"[..3], &mut dst)
            .expect("Must fit");

        assert_eq!(&dst[..size], b"ATE\r");
    }

    #[test]
    fn buffer_too_small() {
        let mut dst = [0_u8; 3];

        assert!(matches!(
            Command::new().encode("AT", &mut dst),
            Err(CommandEncodeError::BufferTooSmall)
        ));
    }
}
