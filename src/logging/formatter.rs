#![cfg_attr(
    not(any(feature = "log", feature = "defmt", feature = "tracing")),
    allow(dead_code)
)]

/// Renders a byte slice for log output.
///
/// With `pretty-hex-fmt` the bytes are printed as hex, otherwise (`char-fmt`)
/// printable ASCII is printed as is and everything else escaped.
pub(crate) struct Formatter<'a>(pub &'a [u8]);

impl core::fmt::Debug for Formatter<'_> {
    #[cfg(feature = "pretty-hex-fmt")]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "[")?;

        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }

            write!(f, "{byte:02x}")?;
        }

        write!(f, "]")
    }

    #[cfg(not(feature = "pretty-hex-fmt"))]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        #[cfg(feature = "char-fmt")]
        {
            write!(f, "\"")?;

            for byte in self.0 {
                write!(f, "{}", core::ascii::escape_default(*byte))?;
            }

            write!(f, "\"")
        }

        #[cfg(not(feature = "char-fmt"))]
        {
            write!(f, "{:?}", self.0)
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Formatter<'_> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=[u8]:a}", self.0)
    }
}
