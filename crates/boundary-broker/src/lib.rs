//! boundary broker: the router that owns the network endpoints.
//!
//! This crate wires the transport, channel registry, router task, announce
//! publisher, advisory lock, and process lifecycle into a cohesive broker
//! stack. It is intended to be consumed by worker-side collaborators and by
//! integration tests.

pub mod boundary;
pub mod client;
pub mod config;
pub mod lifecycle;
pub mod lock;
pub(crate) mod transport;

pub use boundary::{delivery_queue, Boundary, ChannelHandle, Incoming, Mailbox};
pub use client::{AnnounceClient, RequestClient};
pub use config::BrokerConfig;
