//! Peer-side clients: the worker half of the request endpoint and a
//! subscriber for the announce endpoint.

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;

use boundary_core::error::{BoundaryError, Result};
use boundary_core::protocol::wire;
use boundary_core::{ChannelId, Envelope};

use crate::config::schema::DEFAULT_MAX_FRAME_BYTES;
use crate::transport;

/// A peer connection to a boundary's request endpoint.
pub struct RequestClient {
    stream: TcpStream,
    max_frame_bytes: usize,
}

impl RequestClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        })
    }

    /// Transmit a request without waiting for the reply.
    ///
    /// Use this when managing the response loop out-of-band; pair each send
    /// with exactly one later [`recv`](Self::recv).
    pub async fn send(&mut self, channel: &ChannelId, envelope: &Envelope) -> Result<()> {
        let frames = wire::encode_request(channel, envelope)?;
        transport::write_message(&mut self.stream, &frames).await
    }

    /// Read the next reply envelope.
    pub async fn recv(&mut self) -> Result<Envelope> {
        let frames = transport::read_message(&mut self.stream, self.max_frame_bytes).await?;
        wire::decode_reply(&frames)
    }

    /// Send a request and block on its reply.
    pub async fn request(&mut self, channel: &ChannelId, envelope: &Envelope) -> Result<Envelope> {
        self.send(channel, envelope).await?;
        self.recv().await
    }
}

/// A subscriber to a boundary's announce endpoint.
///
/// Each snapshot is the full current truth: `[channel_id, request_address]`
/// pairs for every live channel, or `[]` when there are none.
pub struct AnnounceClient {
    lines: Lines<BufReader<TcpStream>>,
}

impl AnnounceClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            lines: BufReader::new(stream).lines(),
        })
    }

    /// Read the next registry snapshot.
    pub async fn next(&mut self) -> Result<Vec<(String, String)>> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or(BoundaryError::Stopped)?;
        serde_json::from_str(&line)
            .map_err(|e| BoundaryError::protocol(format!("bad announce snapshot: {e}")))
    }
}
