//! Multipart wire layout.
//!
//! A message is a list of binary frames. Peers send requests, the broker
//! sends replies:
//!
//! ```text
//! request  [channel_id, tag, skeleton, buffer...]
//! reply    [tag, skeleton, buffer...]
//! ```
//!
//! `channel_id`, `tag`, and `skeleton` are UTF-8; the remaining frames are
//! the codec's raw buffers in placeholder order. Frame counts below the
//! fixed prefix are protocol errors.

use std::fmt;

use bytes::Bytes;

use crate::error::{BoundaryError, Result};
use crate::protocol::envelope::Envelope;

/// Opaque id naming a logical channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    pub fn new(id: impl Into<String>) -> Self {
        ChannelId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        ChannelId(s.to_owned())
    }
}

impl From<String> for ChannelId {
    fn from(s: String) -> Self {
        ChannelId(s)
    }
}

/// Frame list for a request addressed to `channel`.
pub fn encode_request(channel: &ChannelId, envelope: &Envelope) -> Result<Vec<Bytes>> {
    let (tag, skeleton, buffers) = envelope.to_parts()?;
    let mut frames = Vec::with_capacity(3 + buffers.len());
    frames.push(Bytes::copy_from_slice(channel.as_str().as_bytes()));
    frames.push(Bytes::from_static(tag.as_bytes()));
    frames.push(Bytes::from(skeleton.into_bytes()));
    frames.extend(buffers);
    Ok(frames)
}

/// Parse a request frame list into its target channel and envelope.
pub fn decode_request(frames: &[Bytes]) -> Result<(ChannelId, Envelope)> {
    let [channel, tag, skeleton, buffers @ ..] = frames else {
        return Err(BoundaryError::protocol(format!(
            "request needs at least 3 frames, got {}",
            frames.len()
        )));
    };
    let channel = ChannelId::new(utf8(channel, "channel id")?);
    Ok((channel, envelope_from(tag, skeleton, buffers)?))
}

/// Frame list for a reply (no channel frame; routed by peer identity).
pub fn encode_reply(envelope: &Envelope) -> Result<Vec<Bytes>> {
    let (tag, skeleton, buffers) = envelope.to_parts()?;
    let mut frames = Vec::with_capacity(2 + buffers.len());
    frames.push(Bytes::from_static(tag.as_bytes()));
    frames.push(Bytes::from(skeleton.into_bytes()));
    frames.extend(buffers);
    Ok(frames)
}

/// Parse a reply frame list into an envelope.
pub fn decode_reply(frames: &[Bytes]) -> Result<Envelope> {
    let [tag, skeleton, buffers @ ..] = frames else {
        return Err(BoundaryError::protocol(format!(
            "reply needs at least 2 frames, got {}",
            frames.len()
        )));
    };
    envelope_from(tag, skeleton, buffers)
}

fn envelope_from(tag: &Bytes, skeleton: &Bytes, buffers: &[Bytes]) -> Result<Envelope> {
    Envelope::from_parts(utf8(tag, "class tag")?, utf8(skeleton, "skeleton")?, buffers)
}

fn utf8<'a>(frame: &'a Bytes, what: &str) -> Result<&'a str> {
    std::str::from_utf8(frame)
        .map_err(|_| BoundaryError::protocol(format!("{what} frame is not valid utf-8")))
}
