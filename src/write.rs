//! Transmit passthrough. Outgoing commands are written straight to the serial port.

use embedded_io_async::Write;
use futures::Sink;

use crate::{
    WriteError,
    codec::command::Command,
    encode::Encoder,
    logging::{debug, error, trace},
};

#[cfg(any(feature = "log", feature = "defmt", feature = "tracing"))]
use crate::logging::{Formatter, TX};

/// Writes AT commands into an underlying [`Write`] sink using an [`Encoder`].
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AtWriter<'buf, E, W> {
    buffer: &'buf mut [u8],
    encoder: E,
    writer: W,
}

impl<'buf, W> AtWriter<'buf, Command<'static>, W> {
    /// Creates a new [`AtWriter`] terminating commands with `\r\n`.
    #[inline]
    pub fn new(writer: W, buffer: &'buf mut [u8]) -> Self {
        Self::with_encoder(Command::new(), writer, buffer)
    }
}

impl<'buf, E, W> AtWriter<'buf, E, W> {
    /// Creates a new [`AtWriter`] with the given `encoder` and `writer`.
    ///
    /// `buffer` must fit the longest encoded command.
    #[inline]
    pub fn with_encoder(encoder: E, writer: W, buffer: &'buf mut [u8]) -> Self {
        Self {
            buffer,
            encoder,
            writer,
        }
    }

    /// Returns reference to the encoder.
    #[inline]
    pub const fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Returns mutable reference to the encoder.
    #[inline]
    pub fn encoder_mut(&mut self) -> &mut E {
        &mut self.encoder
    }

    /// Returns reference to the writer.
    #[inline]
    pub const fn writer(&self) -> &W {
        &self.writer
    }

    /// Returns mutable reference to the writer.
    #[inline]
    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Consumes the [`AtWriter`] and returns the `encoder` and `writer`.
    #[inline]
    pub fn into_parts(self) -> (E, W) {
        (self.encoder, self.writer)
    }

    /// Writes `bytes` unchanged and flushes.
    pub async fn write_raw(&mut self, bytes: &[u8]) -> Result<(), W::Error>
    where
        W: Write,
    {
        if let Err(err) = self.writer.write_all(bytes).await {
            error!(target: TX, "Failed to write");

            return Err(err);
        }

        debug!(target: TX, "Wrote. bytes: {:?}", Formatter(bytes));

        self.writer.flush().await
    }

    /// Encodes `command`, writes it and flushes.
    pub async fn send_command<I>(&mut self, command: I) -> Result<(), WriteError<W::Error, E::Error>>
    where
        E: Encoder<I>,
        W: Write,
    {
        match self.encoder.encode(command, self.buffer) {
            Ok(size) => match self.writer.write_all(&self.buffer[..size]).await {
                Ok(_) => {
                    debug!(target: TX, "Wrote. command: {:?}", Formatter(&self.buffer[..size]));

                    match self.writer.flush().await {
                        Ok(_) => {
                            trace!(target: TX, "Flushed");

                            Ok(())
                        }
                        Err(err) => {
                            error!(target: TX, "Failed to flush");

                            Err(WriteError::IO(err))
                        }
                    }
                }
                Err(err) => {
                    error!(target: TX, "Failed to write command");

                    Err(WriteError::IO(err))
                }
            },
            Err(err) => {
                error!(target: TX, "Failed to encode command");

                Err(WriteError::Encode(err))
            }
        }
    }

    /// Converts the [`AtWriter`] into a sink of commands.
    pub fn sink<'this, I>(
        &'this mut self,
    ) -> impl Sink<I, Error = WriteError<W::Error, E::Error>> + 'this
    where
        I: 'this,
        E: Encoder<I>,
        W: Write,
    {
        futures::sink::unfold(self, |this, command: I| async move {
            this.send_command(command).await?;

            Ok::<_, WriteError<W::Error, E::Error>>(this)
        })
    }
}
