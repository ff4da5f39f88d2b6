//! The boundary: registration surface and lifecycle around the router task.
//!
//! Consumers never touch the sockets. They register a delivery queue for a
//! channel id, pop [`Incoming`] requests from their [`Mailbox`], and submit
//! replies through the control channel; the router task performs every send.

pub(crate) mod registry;
pub(crate) mod router;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use boundary_core::error::{BoundaryError, Result};
use boundary_core::{ChannelId, Envelope};

use crate::config::BrokerConfig;
use registry::ChannelRegistry;
use router::Router;

/// Router-assigned identity of one peer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(pub(crate) u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer-{}", self.0)
    }
}

/// Commands serviced by the router task.
pub(crate) enum Control {
    /// A consumer reply for `peer`; the registry is re-checked at send time.
    Reply {
        channel: ChannelId,
        peer: PeerId,
        envelope: Envelope,
    },
    /// Publish a registry snapshot now.
    Announce,
    Shutdown,
}

/// A request delivered to a channel's queue, with the routing metadata
/// needed to answer it.
///
/// `reply` consumes the value: one received request, at most one reply.
#[derive(Debug)]
pub struct Incoming {
    envelope: Envelope,
    channel: ChannelId,
    peer: PeerId,
    control: mpsc::UnboundedSender<Control>,
}

impl Incoming {
    pub(crate) fn new(
        envelope: Envelope,
        channel: ChannelId,
        peer: PeerId,
        control: mpsc::UnboundedSender<Control>,
    ) -> Self {
        Self {
            envelope,
            channel,
            peer,
            control,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    /// Queue `envelope` for transmission back to the originating peer.
    ///
    /// The router substitutes `Envelope::Exited` if the channel has been
    /// cancelled since this request was dequeued.
    pub fn reply(self, envelope: Envelope) -> Result<()> {
        self.control
            .send(Control::Reply {
                channel: self.channel,
                peer: self.peer,
                envelope,
            })
            .map_err(|_| BoundaryError::Stopped)
    }
}

/// Create a delivery queue: the sender half is handed to
/// [`Boundary::register`], the [`Mailbox`] stays with the consumer.
pub fn delivery_queue() -> (mpsc::UnboundedSender<Incoming>, Mailbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, Mailbox { rx })
}

/// Consumer-side receiving half of a channel's delivery queue.
pub struct Mailbox {
    rx: mpsc::UnboundedReceiver<Incoming>,
}

impl Mailbox {
    /// Wait up to `wait` for the next request.
    ///
    /// Returns `Timeout` when the wait elapses and `Stopped` when the
    /// channel was cancelled and every queued request already drained.
    pub async fn recv(&mut self, wait: Duration) -> Result<Incoming> {
        match tokio::time::timeout(wait, self.rx.recv()).await {
            Ok(Some(incoming)) => Ok(incoming),
            Ok(None) => Err(BoundaryError::Stopped),
            Err(_) => Err(BoundaryError::Timeout),
        }
    }
}

/// Handle returned by [`Boundary::register`]; its only operation is
/// cancelling the registration.
pub struct ChannelHandle {
    boundary: Boundary,
    channel: ChannelId,
}

impl std::fmt::Debug for ChannelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandle")
            .field("channel", &self.channel)
            .finish()
    }
}

impl ChannelHandle {
    pub fn channel(&self) -> &ChannelId {
        &self.channel
    }

    pub fn cancel(&self) {
        self.boundary.cancel(&self.channel);
    }
}

/// The process-local message broker.
///
/// Cheap to clone; all clones share one router task. See
/// [`crate::lifecycle`] for the process-wide shared instance.
#[derive(Clone)]
pub struct Boundary {
    inner: Arc<BoundaryInner>,
}

struct BoundaryInner {
    request_address: String,
    announce_address: String,
    registry: Arc<ChannelRegistry>,
    control: mpsc::UnboundedSender<Control>,
    router: Mutex<Option<JoinHandle<()>>>,
    join_timeout: Duration,
}

impl Boundary {
    /// Bind both endpoints and spawn the router task.
    ///
    /// Bind failures are fatal and leave nothing running.
    pub async fn start(config: BrokerConfig) -> Result<Boundary> {
        config.validate()?;

        let request_listener = TcpListener::bind(&config.request_listen).await?;
        let announce_listener = TcpListener::bind(&config.announce_listen).await?;
        let request_address = request_listener.local_addr()?.to_string();
        let announce_address = announce_listener.local_addr()?.to_string();

        let registry = Arc::new(ChannelRegistry::new());
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        let router = Router::new(
            request_listener,
            announce_listener,
            request_address.clone(),
            Arc::clone(&registry),
            control_tx.clone(),
            control_rx,
            Duration::from_millis(config.heartbeat_ms),
            config.max_frame_bytes,
        );
        let task = tokio::spawn(router.run());

        info!(%request_address, %announce_address, "boundary started");
        Ok(Boundary {
            inner: Arc::new(BoundaryInner {
                request_address,
                announce_address,
                registry,
                control: control_tx,
                router: Mutex::new(Some(task)),
                join_timeout: Duration::from_millis(config.join_timeout_ms),
            }),
        })
    }

    /// Address peers send requests to.
    pub fn request_address(&self) -> &str {
        &self.inner.request_address
    }

    /// Address announce subscribers connect to.
    pub fn announce_address(&self) -> &str {
        &self.inner.announce_address
    }

    /// Register a delivery queue for `channel`.
    ///
    /// Errors with `ChannelExists` on a duplicate id and `Stopped` after
    /// shutdown. Triggers an immediate announce.
    pub fn register(
        &self,
        channel: ChannelId,
        queue: mpsc::UnboundedSender<Incoming>,
    ) -> Result<ChannelHandle> {
        self.inner.registry.insert(channel.clone(), queue)?;
        if self.inner.control.send(Control::Announce).is_err() {
            self.inner.registry.remove(&channel);
            return Err(BoundaryError::Stopped);
        }
        debug!(%channel, "channel registered");
        Ok(ChannelHandle {
            boundary: self.clone(),
            channel,
        })
    }

    /// Remove `channel` from the registry; a no-op when absent.
    ///
    /// The entry is gone before this returns: requests and replies touching
    /// the channel from now on resolve to `Envelope::Exited`.
    pub fn cancel(&self, channel: &ChannelId) {
        if self.inner.registry.remove(channel) {
            debug!(%channel, "channel cancelled");
            let _ = self.inner.control.send(Control::Announce);
        }
    }

    /// Stop the router task and release both endpoints.
    ///
    /// Safe with channels still registered (they are implicitly cancelled)
    /// and safe to call more than once. Waits up to the configured join
    /// timeout, then aborts the task.
    pub async fn shutdown(&self) {
        let _ = self.inner.control.send(Control::Shutdown);
        let task = self.inner.router.lock().await.take();
        if let Some(mut task) = task {
            if tokio::time::timeout(self.inner.join_timeout, &mut task)
                .await
                .is_err()
            {
                warn!("router task did not stop within join timeout, aborting");
                task.abort();
            }
        }
        self.inner.registry.clear();
        info!("boundary stopped");
    }
}
