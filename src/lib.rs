//! # atframe
//!
//! Receive-side framing and classification of AT command responses for a microcontroller acting
//! as the AT master of a modem or similar module.
//!
//! Bytes are fed one at a time from the serial RX interrupt into [`AtMaster::on_rx_interrupt`].
//! The framer stores them in a fixed size ring buffer and marks the end of every message,
//! recognised by `\r\n`, `\n` or a fixed length (see [`LineMode`]). The foreground calls
//! [`AtMaster::process`] to classify the oldest message against the registered prefixes and copy its payload.
//!
//! Outgoing commands go through [`AtWriter`], a passthrough over [`embedded_io_async`]'s
//! [`Write`](https://docs.rs/embedded-io-async/latest/embedded_io_async/trait.Write.html) trait.
//!
//! Shared state is protected with [`critical_section`], the application must provide an implementation.
//!
//! ## Features
//!
//! - `log`: Enables logging using [`log`](https://docs.rs/log/latest/log/).
//! - `tracing`: Enables logging using [`tracing`](https://docs.rs/tracing/latest/tracing/).
//! - `defmt`: Enables logging using [`defmt`](https://docs.rs/defmt/latest/defmt/index.html)
//!   and implements [`defmt::Format`](https://docs.rs/defmt/latest/defmt/trait.Format.html) for structs and enums.
//! - `char-fmt`: Logs payloads as escaped characters.
//! - `pretty-hex-fmt`: Logs payloads as hex.

#![no_std]
#![deny(unsafe_code)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod encode;
pub mod framer;
pub mod prefix;
pub mod ring;
pub mod serial;
pub mod status;

mod error;
pub use error::WriteError;

mod master;
pub use master::AtMaster;

mod response;
pub use response::{Message, ResponseKind};

mod write;
pub use write::AtWriter;

pub use framer::LineMode;

pub(crate) mod logging;

#[doc(hidden)]
#[allow(missing_docs)]
pub mod mock;

#[cfg(test)]
mod tests;

#[cfg(test)]
extern crate std;
