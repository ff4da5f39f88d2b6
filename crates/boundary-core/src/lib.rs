//! boundary core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the structured value codec, the envelope tagged union,
//! and the multipart wire layout shared by the broker and by peer-side
//! tooling. It intentionally carries no transport or runtime dependencies so
//! it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `BoundaryError`/`Result` so the broker
//! process does not crash on malformed input or bad traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod codec;
pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{BoundaryError, Result};

pub use codec::{ArrayData, Dtype, Value};
pub use protocol::envelope::Envelope;
pub use protocol::wire::ChannelId;
