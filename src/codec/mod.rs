//! Encoders for outgoing AT traffic.

pub mod command;
