//! Top-level facade crate for the boundary stack.
//!
//! Re-exports the protocol core and the broker so users can depend on a
//! single crate.

pub mod core {
    pub use boundary_core::*;
}

pub mod broker {
    pub use boundary_broker::*;
}
