//! Protocol modules (envelope tagged union + multipart wire layout).
//!
//! This module hosts the message-level contracts:
//! - `envelope`: the closed set of message classes and their payloads.
//! - `wire`: the multipart frame lists exchanged with peers.
//!
//! All parsers are panic-free: malformed input is reported as
//! `BoundaryError` instead of panicking or indexing raw buffers, keeping the
//! broker resilient to hostile traffic.

pub mod envelope;
pub mod wire;
