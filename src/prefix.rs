//! Prefix registry used to classify framed messages.

use crate::{response::ResponseKind, ring::RingBuffer};

/// The prefixes a message at the tail of the ring buffer is compared against.
///
/// Prefixes are borrowed. A prefix ends at its first `\0`, so C strings can be passed as is.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Prefixes<'p> {
    ok: &'p [u8],
    error: &'p [u8],
    init: Option<&'p [u8]>,
    custom: Option<&'p [u8]>,
    /// The init prefix is armed.
    wait_init: bool,
}

impl<'p> Prefixes<'p> {
    /// Creates a new [`Prefixes`] with the `ok` and `error` prefixes.
    #[inline]
    pub const fn new(ok: &'p [u8], error: &'p [u8]) -> Self {
        Self {
            ok,
            error,
            init: None,
            custom: None,
            wait_init: false,
        }
    }

    /// Returns the ok prefix.
    #[inline]
    pub const fn ok(&self) -> &'p [u8] {
        self.ok
    }

    /// Returns the error prefix.
    #[inline]
    pub const fn error(&self) -> &'p [u8] {
        self.error
    }

    /// Returns the init prefix.
    #[inline]
    pub const fn init(&self) -> Option<&'p [u8]> {
        self.init
    }

    /// Returns the custom prefix.
    #[inline]
    pub const fn custom(&self) -> Option<&'p [u8]> {
        self.custom
    }

    /// Returns `true` while the init prefix is armed.
    #[inline]
    pub const fn is_waiting_init(&self) -> bool {
        self.wait_init
    }

    /// Sets the init prefix and arms it for a single match.
    #[inline]
    pub fn set_init(&mut self, init: &'p [u8]) {
        self.init = Some(init);
        self.wait_init = true;
    }

    /// Sets the custom prefix.
    #[inline]
    pub fn set_custom(&mut self, custom: &'p [u8]) {
        self.custom = Some(custom);
    }

    /// Removes the custom prefix.
    #[inline]
    pub fn clear_custom(&mut self) {
        self.custom = None;
    }

    /// Classifies the message at the tail of `ring`.
    ///
    /// Precedence is init (while armed), ok, error, custom. Matching the init prefix disarms it.
    /// Must only be called while a framed message sits at the tail.
    pub fn classify<const N: usize>(&mut self, ring: &RingBuffer<N>) -> ResponseKind {
        if self.wait_init {
            if let Some(init) = self.init {
                if ring.compare(init, false) {
                    self.wait_init = false;

                    return ResponseKind::Init;
                }
            }
        }

        if ring.compare(self.ok, false) {
            return ResponseKind::Ok;
        }

        if ring.compare(self.error, false) {
            return ResponseKind::Error;
        }

        match self.custom {
            Some(custom) if ring.compare(custom, false) => ResponseKind::Custom,
            _ => ResponseKind::Other,
        }
    }
}
