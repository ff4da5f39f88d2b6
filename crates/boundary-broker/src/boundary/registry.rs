//! Channel registry: channel id -> delivery queue sender.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;

use boundary_core::error::{BoundaryError, Result};
use boundary_core::ChannelId;

use crate::boundary::Incoming;

/// Live registrations, shared between the boundary surface and the router
/// task. At most one registration per channel id.
#[derive(Default)]
pub(crate) struct ChannelRegistry {
    channels: DashMap<ChannelId, mpsc::UnboundedSender<Incoming>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn insert(&self, channel: ChannelId, queue: mpsc::UnboundedSender<Incoming>) -> Result<()> {
        match self.channels.entry(channel) {
            Entry::Occupied(entry) => Err(BoundaryError::ChannelExists(entry.key().to_string())),
            Entry::Vacant(entry) => {
                entry.insert(queue);
                Ok(())
            }
        }
    }

    /// Remove a registration; returns whether it existed.
    pub fn remove(&self, channel: &ChannelId) -> bool {
        self.channels.remove(channel).is_some()
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.channels.contains_key(channel)
    }

    pub fn sender(&self, channel: &ChannelId) -> Option<mpsc::UnboundedSender<Incoming>> {
        self.channels.get(channel).map(|r| r.value().clone())
    }

    /// Snapshot of the registered ids, for announcements.
    pub fn ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|r| r.key().clone()).collect()
    }

    pub fn clear(&self) {
        self.channels.clear();
    }
}
