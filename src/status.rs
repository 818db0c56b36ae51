//! Observational status events emitted by the framer.
//!
//! Boards usually wire these to LEDs, see [`Leds`]. Nothing in the receive path depends on them.

use embedded_hal::digital::StatefulOutputPin;

/// Receives status events from the interrupt handler.
///
/// All methods default to doing nothing and run inside the driver's critical section,
/// so implementations must be short.
pub trait StatusSink {
    /// A byte arrived on the wire.
    fn byte_received(&mut self) {}

    /// A message was framed.
    fn frame_completed(&mut self) {}

    /// A `\0` byte arrived on the wire.
    fn nul_received(&mut self) {}
}

impl<S> StatusSink for &mut S
where
    S: StatusSink,
{
    fn byte_received(&mut self) {
        (*self).byte_received();
    }

    fn frame_completed(&mut self) {
        (*self).frame_completed();
    }

    fn nul_received(&mut self) {
        (*self).nul_received();
    }
}

/// A [`StatusSink`] that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoStatus;

impl StatusSink for NoStatus {}

/// Toggles one output pin per status event.
///
/// Pin errors are ignored, an indicator that fails to toggle must not disturb framing.
#[derive(Debug)]
pub struct Leds<B, F, Z> {
    /// Toggled on every received byte.
    pub byte: B,
    /// Toggled on every framed message.
    pub frame: F,
    /// Toggled on every received `\0`.
    pub nul: Z,
}

impl<B, F, Z> Leds<B, F, Z> {
    /// Creates a new [`Leds`] sink.
    #[inline]
    pub const fn new(byte: B, frame: F, nul: Z) -> Self {
        Self { byte, frame, nul }
    }
}

impl<B, F, Z> StatusSink for Leds<B, F, Z>
where
    B: StatefulOutputPin,
    F: StatefulOutputPin,
    Z: StatefulOutputPin,
{
    fn byte_received(&mut self) {
        let _ = self.byte.toggle();
    }

    fn frame_completed(&mut self) {
        let _ = self.frame.toggle();
    }

    fn nul_received(&mut self) {
        let _ = self.nul.toggle();
    }
}
