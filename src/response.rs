//! Classified responses handed to the application.

use heapless::Vec;

/// Classification of a framed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseKind {
    /// No message was pending.
    None,
    /// The message matched the armed init prefix.
    Init,
    /// The message matched the ok prefix.
    Ok,
    /// The message matched the error prefix.
    Error,
    /// The message matched the custom prefix.
    Custom,
    /// The message matched no registered prefix.
    Other,
    /// The message was empty.
    BlankLine,
}

impl ResponseKind {
    /// Returns `true` unless this is [`ResponseKind::None`].
    #[inline]
    pub const fn is_some(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl core::fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Init => write!(f, "init"),
            Self::Ok => write!(f, "ok"),
            Self::Error => write!(f, "error"),
            Self::Custom => write!(f, "custom"),
            Self::Other => write!(f, "other"),
            Self::BlankLine => write!(f, "blank line"),
        }
    }
}

/// An owned classified message.
///
/// Payloads longer than `M` bytes are truncated, [`len`](Message::len) keeps the framed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<const M: usize> {
    /// The classification, never [`ResponseKind::None`].
    pub kind: ResponseKind,
    /// The framed bytes without terminator, at most `M` of them.
    pub payload: Vec<u8, M>,
    /// Length of the framed message before truncation.
    pub len: usize,
}

impl<const M: usize> Message<M> {
    /// Returns the length of the framed message before truncation.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the framed message was empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the payload lost bytes to the capacity `M`.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.len > self.payload.len()
    }

    /// Returns the payload as `str` if it is valid utf8.
    pub fn as_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(&self.payload)
    }
}

#[cfg(feature = "defmt")]
impl<const M: usize> defmt::Format for Message<M> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "Message {{ kind: {}, payload: {=[u8]:a}, len: {} }}",
            self.kind,
            self.payload.as_slice(),
            self.len
        )
    }
}
