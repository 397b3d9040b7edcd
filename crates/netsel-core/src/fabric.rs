// ── In-memory fabric ──
//
// Connects `Node`s in one process. Delivers by destination NID, lets the
// receiving node answer GETs, and can black-hole individual NIDs.

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::model::Nid;
use crate::node::Node;
use crate::transport::{Delivery, Discovery, Message, Transport, TransportError};

#[derive(Default)]
pub struct Fabric {
    nodes: DashMap<Nid, Arc<Node>>,
    failed: DashSet<Nid>,
}

impl Fabric {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every NID currently configured on `node` reachable.
    pub fn attach(&self, node: &Arc<Node>) {
        for nid in node.list_nids() {
            self.nodes.insert(nid, Arc::clone(node));
        }
        debug!(node = node.name(), "attached to fabric");
    }

    /// Drop everything sent to `nid` until it is restored.
    pub fn fail_nid(&self, nid: Nid) {
        self.failed.insert(nid);
    }

    pub fn restore_nid(&self, nid: &Nid) {
        self.failed.remove(nid);
    }

    pub fn node_for(&self, nid: &Nid) -> Option<Arc<Node>> {
        self.nodes.get(nid).map(|n| Arc::clone(n.value()))
    }
}

impl Transport for Fabric {
    fn transmit(&self, msg: &Message) -> Result<Delivery, TransportError> {
        if self.failed.contains(&msg.dst) {
            return Err(TransportError::Dropped { dst: msg.dst });
        }
        let node = self
            .node_for(&msg.dst)
            .ok_or(TransportError::Unreachable { dst: msg.dst })?;

        match node.receive(msg) {
            Ok(Some(_reply)) => Ok(Delivery::Replied),
            Ok(None) => Ok(Delivery::Delivered),
            Err(_) => Err(TransportError::Unreachable { dst: msg.dst }),
        }
    }
}

impl Discovery for Fabric {
    fn discover(&self, nid: &Nid) -> Vec<Nid> {
        self.node_for(nid).map(|n| n.list_nids()).unwrap_or_default()
    }
}
