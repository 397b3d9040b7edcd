// ── Transport and discovery seams ──
//
// The engine never touches a wire. It hands a fully addressed message to
// a `Transport` and asks a `Discovery` for a peer's NIDs.

use serde::Serialize;
use strum::Display;
use thiserror::Error;

use crate::model::Nid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    /// One-way data.
    Put,
    /// Request expecting a reply (ping).
    Get,
    Reply,
}

/// A message with both ends resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub src: Nid,
    pub dst: Nid,
    pub kind: MessageKind,
}

/// Outcome of a successful transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Delivery {
    Delivered,
    /// The peer answered a GET; the reply arrived on the sending NI.
    Replied,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The message left but was lost in flight.
    #[error("message to {dst} dropped")]
    Dropped { dst: Nid },

    /// Nothing answers at the destination.
    #[error("{dst} is unreachable")]
    Unreachable { dst: Nid },
}

pub trait Transport: Send + Sync {
    fn transmit(&self, msg: &Message) -> Result<Delivery, TransportError>;
}

pub trait Discovery: Send + Sync {
    /// Every NID of the peer owning `nid`; empty when discovery fails.
    fn discover(&self, nid: &Nid) -> Vec<Nid>;
}
