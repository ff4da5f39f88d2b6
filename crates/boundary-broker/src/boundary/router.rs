//! The router task: the one owner of all socket I/O.
//!
//! Request endpoints in this transport style are not safe to share between
//! tasks, so every send and receive happens here. Consumers reach the
//! router only through thread-safe edges: the registry, the per-channel
//! delivery queues, and the control channel. The loop re-checks the
//! registry when a reply is sent, not only when the request arrived, so a
//! cancel that lands between dequeue and reply still resolves to Exited.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use boundary_core::protocol::wire;
use boundary_core::{ChannelId, Envelope};

use crate::boundary::registry::ChannelRegistry;
use crate::boundary::{Control, Incoming, PeerId};
use crate::transport;

/// Traffic surfaced by per-peer reader tasks.
enum PeerEvent {
    Message { peer: PeerId, frames: Vec<Bytes> },
    Disconnected { peer: PeerId },
}

pub(crate) struct Router {
    request_listener: TcpListener,
    announce_listener: TcpListener,
    request_address: String,
    registry: Arc<ChannelRegistry>,
    control_tx: mpsc::UnboundedSender<Control>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    inbound_tx: mpsc::UnboundedSender<PeerEvent>,
    inbound_rx: mpsc::UnboundedReceiver<PeerEvent>,
    peers: HashMap<PeerId, mpsc::UnboundedSender<Vec<Bytes>>>,
    subscribers: Vec<mpsc::UnboundedSender<String>>,
    next_peer: u64,
    heartbeat: Duration,
    max_frame_bytes: usize,
}

impl Router {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        request_listener: TcpListener,
        announce_listener: TcpListener,
        request_address: String,
        registry: Arc<ChannelRegistry>,
        control_tx: mpsc::UnboundedSender<Control>,
        control_rx: mpsc::UnboundedReceiver<Control>,
        heartbeat: Duration,
        max_frame_bytes: usize,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            request_listener,
            announce_listener,
            request_address,
            registry,
            control_tx,
            control_rx,
            inbound_tx,
            inbound_rx,
            peers: HashMap::new(),
            subscribers: Vec::new(),
            next_peer: 0,
            heartbeat,
            max_frame_bytes,
        }
    }

    pub async fn run(mut self) {
        let mut tick = tokio::time::interval(self.heartbeat);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                accepted = self.request_listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept_peer(stream, addr),
                    Err(e) => warn!(error = %e, "request accept failed"),
                },

                accepted = self.announce_listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept_subscriber(stream, addr),
                    Err(e) => warn!(error = %e, "announce accept failed"),
                },

                Some(event) = self.inbound_rx.recv() => self.handle_peer_event(event),

                command = self.control_rx.recv() => match command {
                    Some(Control::Reply { channel, peer, envelope }) => {
                        self.handle_reply(channel, peer, envelope);
                    }
                    Some(Control::Announce) => self.announce(),
                    Some(Control::Shutdown) | None => break,
                },

                _ = tick.tick() => self.announce(),
            }
        }

        info!("router stopped");
    }

    fn accept_peer(&mut self, stream: TcpStream, addr: SocketAddr) {
        let peer = PeerId(self.next_peer);
        self.next_peer += 1;

        let (read_half, write_half) = stream.into_split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.peers.insert(peer, out_tx);
        tokio::spawn(peer_read_loop(
            peer,
            read_half,
            self.inbound_tx.clone(),
            self.max_frame_bytes,
        ));
        tokio::spawn(peer_write_loop(write_half, out_rx));
        debug!(%peer, %addr, "peer connected");
    }

    fn accept_subscriber(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        tokio::spawn(announce_write_loop(stream, rx));
        debug!(%addr, "announce subscriber connected");
    }

    fn handle_peer_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Message { peer, frames } => match wire::decode_request(&frames) {
                Ok((channel, envelope)) => self.dispatch(channel, peer, envelope),
                Err(e) => warn!(%peer, error = %e, "dropping malformed request"),
            },
            PeerEvent::Disconnected { peer } => {
                self.peers.remove(&peer);
                debug!(%peer, "peer disconnected");
            }
        }
    }

    /// Step for an inbound request: deliver if the channel is live,
    /// otherwise answer Exited on the spot.
    fn dispatch(&mut self, channel: ChannelId, peer: PeerId, envelope: Envelope) {
        let Some(queue) = self.registry.sender(&channel) else {
            debug!(%channel, %peer, "request for unregistered channel");
            self.send_reply(peer, &Envelope::Exited);
            return;
        };

        let incoming = Incoming::new(envelope, channel.clone(), peer, self.control_tx.clone());
        if queue.send(incoming).is_ok() {
            debug!(%channel, %peer, "request delivered");
        } else {
            // Consumer dropped its mailbox without cancelling.
            self.registry.remove(&channel);
            debug!(%channel, %peer, "delivery queue gone, channel dropped");
            self.send_reply(peer, &Envelope::Exited);
            self.announce();
        }
    }

    /// Step for a consumer reply: the registry decides, at send time,
    /// whether the consumer's envelope or Exited goes out.
    fn handle_reply(&mut self, channel: ChannelId, peer: PeerId, envelope: Envelope) {
        let envelope = if self.registry.contains(&channel) {
            envelope
        } else {
            debug!(%channel, %peer, "channel cancelled before reply, substituting exited");
            Envelope::Exited
        };
        self.send_reply(peer, &envelope);
    }

    fn send_reply(&mut self, peer: PeerId, envelope: &Envelope) {
        let frames = match wire::encode_reply(envelope) {
            Ok(frames) => frames,
            Err(e) => {
                warn!(%peer, error = %e, "reply envelope failed to encode");
                return;
            }
        };
        let gone = match self.peers.get(&peer) {
            Some(tx) => tx.send(frames).is_err(),
            None => {
                debug!(%peer, "reply for disconnected peer dropped");
                false
            }
        };
        if gone {
            self.peers.remove(&peer);
        }
    }

    /// Publish `[[channel_id, request_address], ...]` to every subscriber.
    fn announce(&mut self) {
        let snapshot: Vec<(String, &str)> = self
            .registry
            .ids()
            .into_iter()
            .map(|id| (id.to_string(), self.request_address.as_str()))
            .collect();
        let line = match serde_json::to_string(&snapshot) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "announce snapshot failed to serialize");
                return;
            }
        };
        self.subscribers.retain(|tx| tx.send(line.clone()).is_ok());
    }
}

async fn peer_read_loop(
    peer: PeerId,
    mut read_half: OwnedReadHalf,
    inbound: mpsc::UnboundedSender<PeerEvent>,
    max_frame_bytes: usize,
) {
    loop {
        match transport::read_message(&mut read_half, max_frame_bytes).await {
            Ok(frames) => {
                if inbound.send(PeerEvent::Message { peer, frames }).is_err() {
                    return;
                }
            }
            // EOF or a corrupt length prefix; either way this connection
            // cannot be resynchronized.
            Err(_) => {
                let _ = inbound.send(PeerEvent::Disconnected { peer });
                return;
            }
        }
    }
}

async fn peer_write_loop(
    mut write_half: OwnedWriteHalf,
    mut outbound: mpsc::UnboundedReceiver<Vec<Bytes>>,
) {
    while let Some(frames) = outbound.recv().await {
        if transport::write_message(&mut write_half, &frames)
            .await
            .is_err()
        {
            return;
        }
    }
}

async fn announce_write_loop(mut stream: TcpStream, mut lines: mpsc::UnboundedReceiver<String>) {
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        if stream.write_all(line.as_bytes()).await.is_err() {
            return;
        }
    }
}
