//! Envelope: the closed set of message classes exchanged with peers.
//!
//! Every wire message carries a class tag; the tag maps onto exactly one
//! variant here. Adding a message class means adding a variant and its tag
//! arm, which the compiler then enforces everywhere the envelope is
//! consumed. Unknown tags are a protocol error, never a silent drop.

use bytes::Bytes;

use crate::codec::{self, Value};
use crate::error::{BoundaryError, Result};

const TAG_REQUEST: &str = "request";
const TAG_REPLY: &str = "reply";
const TAG_EXITED: &str = "exited";

const NO_PAYLOAD: Value = Value::Null;

/// A typed message: class tag + structured payload (+ binary attachments,
/// carried inside the payload's arrays).
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A request addressed to a channel, expecting one reply.
    Request(Value),
    /// A normal reply produced by the channel's consumer.
    Reply(Value),
    /// Terminal reply synthesized when the target channel is gone.
    Exited,
}

impl Envelope {
    /// Wire class tag for this variant.
    pub fn tag(&self) -> &'static str {
        match self {
            Envelope::Request(_) => TAG_REQUEST,
            Envelope::Reply(_) => TAG_REPLY,
            Envelope::Exited => TAG_EXITED,
        }
    }

    /// Structured payload; `Exited` carries none.
    pub fn payload(&self) -> &Value {
        match self {
            Envelope::Request(v) | Envelope::Reply(v) => v,
            Envelope::Exited => &NO_PAYLOAD,
        }
    }

    /// Serialize to (tag, skeleton text, buffers).
    pub fn to_parts(&self) -> Result<(&'static str, String, Vec<Bytes>)> {
        let (skeleton, buffers) = codec::encode(self.payload())?;
        Ok((self.tag(), skeleton, buffers))
    }

    /// Rebuild an envelope from its wire parts.
    ///
    /// The payload is decoded for every tag so a malformed message is
    /// rejected uniformly; `Exited` then discards it.
    pub fn from_parts(tag: &str, skeleton: &str, buffers: &[Bytes]) -> Result<Self> {
        let payload = codec::decode(skeleton, buffers)?;
        match tag {
            TAG_REQUEST => Ok(Envelope::Request(payload)),
            TAG_REPLY => Ok(Envelope::Reply(payload)),
            TAG_EXITED => Ok(Envelope::Exited),
            other => Err(BoundaryError::UnknownTag(other.to_owned())),
        }
    }
}
