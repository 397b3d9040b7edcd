// ── Node facade ──
//
// Owns one node's registry, rule store, counters and peer table, and
// drives sends through the selection engine. `Node` is `Send + Sync`;
// share it across sender threads behind an `Arc`.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::counters::{CounterKind, CounterSnapshot, TrafficCounters};
use crate::error::CoreError;
use crate::model::{
    InstalledRule, Interface, InterfaceSpec, InterfaceState, NetId, Network, Nid, Rule, RuleId,
};
use crate::select::{Route, select_route};
use crate::store::{NetworkRegistry, RuleStore};
use crate::transport::{Delivery, Discovery, Message, MessageKind, Transport, TransportError};

// ── Options ─────────────────────────────────────────────────────────

/// How sends spread over routes of equal standing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Balance {
    /// Rotate through the leading group of equally ranked routes.
    #[default]
    RoundRobin,
    /// Always start with the first route.
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeOptions {
    /// Expand a destination NID to all of the peer's NIDs before selecting.
    pub discovery: bool,
    pub balance: Balance,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            discovery: true,
            balance: Balance::RoundRobin,
        }
    }
}

/// Result of a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendReport {
    pub route: Route,
    /// Routes tried, including the one that succeeded.
    pub attempts: usize,
    pub delivery: Delivery,
}

// ── Node ────────────────────────────────────────────────────────────

pub struct Node {
    name: String,
    options: NodeOptions,
    registry: NetworkRegistry,
    rules: RuleStore,
    counters: TrafficCounters,
    /// Any known peer NID -> every NID of that peer.
    peers: DashMap<Nid, Arc<Vec<Nid>>>,
    sequence: AtomicUsize,
}

impl Node {
    pub fn new(name: impl Into<String>, options: NodeOptions) -> Self {
        Self {
            name: name.into(),
            options,
            registry: NetworkRegistry::new(),
            rules: RuleStore::new(),
            counters: TrafficCounters::new(),
            peers: DashMap::new(),
            sequence: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> NodeOptions {
        self.options
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn counters(&self) -> &TrafficCounters {
        &self.counters
    }

    /// Scoped handle that tears the node down when dropped.
    pub fn guard(self: &Arc<Self>) -> NodeGuard {
        NodeGuard {
            node: Arc::clone(self),
        }
    }

    // ── Configuration ────────────────────────────────────────────────

    pub fn configure_net(
        &self,
        net: NetId,
        interfaces: &[InterfaceSpec],
    ) -> Result<Arc<Network>, CoreError> {
        let network = self.registry.add_network(net, interfaces)?;
        for nid in network.nids() {
            self.counters.register(nid);
        }
        Ok(network)
    }

    pub fn unconfigure_net(&self, net: NetId) -> Result<(), CoreError> {
        self.registry.remove_network(net)?;
        self.counters.unregister_net(net);
        Ok(())
    }

    /// Remove every network, rule, counter and peer.
    pub fn unconfigure(&self) {
        let removed = self.registry.remove_all();
        self.rules.clear();
        self.counters.clear();
        self.peers.clear();
        info!(node = %self.name, networks = removed.len(), "node unconfigured");
    }

    pub fn set_interface_state(&self, name: &str, state: InterfaceState) -> Result<(), CoreError> {
        self.registry.set_interface_state(name, state)
    }

    pub fn list_nids(&self) -> Vec<Nid> {
        self.registry.list_nids()
    }

    pub fn add_rule(&self, rule: Rule) -> Result<RuleId, CoreError> {
        self.rules.add(rule)
    }

    pub fn insert_rule(&self, idx: usize, rule: Rule) -> Result<RuleId, CoreError> {
        self.rules.insert(idx, rule)
    }

    pub fn remove_rule(&self, idx: usize) -> Result<Arc<InstalledRule>, CoreError> {
        self.rules.remove(idx)
    }

    pub fn clear_rules(&self) {
        self.rules.clear();
    }

    pub fn stats(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    // ── Peers ────────────────────────────────────────────────────────

    /// Record `nids` as the NIDs of one peer.
    pub fn add_peer(&self, nids: Vec<Nid>) {
        if nids.is_empty() {
            return;
        }
        let nids = Arc::new(nids);
        for nid in nids.iter() {
            self.peers.insert(*nid, Arc::clone(&nids));
        }
    }

    /// Ask `discovery` for the peer's NIDs and record them.
    ///
    /// With discovery disabled, or when it comes back empty, only `nid`
    /// itself is recorded.
    pub fn discover(&self, discovery: &dyn Discovery, nid: Nid) -> Vec<Nid> {
        let mut nids = if self.options.discovery {
            discovery.discover(&nid)
        } else {
            Vec::new()
        };
        if nids.is_empty() {
            debug!(%nid, "discovery returned nothing; using the NID alone");
            nids.push(nid);
        } else if !nids.contains(&nid) {
            nids.insert(0, nid);
        }
        self.add_peer(nids.clone());
        nids
    }

    /// NIDs selection should consider for `nid`.
    pub fn peer_nids(&self, nid: Nid) -> Vec<Nid> {
        if !self.options.discovery {
            return vec![nid];
        }
        self.peers
            .get(&nid)
            .map_or_else(|| vec![nid], |nids| Vec::clone(&nids))
    }

    /// Known peers, each listed once, ordered by their first NID.
    pub fn peers(&self) -> Vec<Arc<Vec<Nid>>> {
        let mut seen: Vec<Arc<Vec<Nid>>> = Vec::new();
        for entry in &self.peers {
            if !seen.iter().any(|p| Arc::ptr_eq(p, entry.value())) {
                seen.push(Arc::clone(entry.value()));
            }
        }
        seen.sort_by_key(|p| p.first().copied());
        seen
    }

    // ── Traffic ──────────────────────────────────────────────────────

    /// Routes to `nid` in the order a send would try them.
    pub fn routes(&self, nid: Nid) -> Result<Vec<Route>, CoreError> {
        select_route(
            &self.registry.networks(),
            &self.rules.list(),
            &self.peer_nids(nid),
        )
    }

    /// Send one message to `nid`, falling back through the selected routes.
    ///
    /// A delivered attempt counts `send` on the local NI used, plus `recv`
    /// when the peer replied. A dropped attempt counts `drop`, an
    /// unreachable one counts `error`. `NoRoute` leaves every counter
    /// untouched.
    pub fn send(
        &self,
        transport: &dyn Transport,
        nid: Nid,
        kind: MessageKind,
    ) -> Result<SendReport, CoreError> {
        let mut routes = self.routes(nid)?;
        self.balance(&mut routes);
        let attempts = routes.len();

        for (attempt, route) in routes.into_iter().enumerate() {
            let msg = Message {
                src: route.local,
                dst: route.remote,
                kind,
            };
            match transport.transmit(&msg) {
                Ok(delivery) => {
                    self.count(&route.local, CounterKind::Send);
                    if delivery == Delivery::Replied {
                        self.count(&route.local, CounterKind::Recv);
                    }
                    debug!(src = %msg.src, dst = %msg.dst, %kind, %delivery, "sent");
                    return Ok(SendReport {
                        route,
                        attempts: attempt + 1,
                        delivery,
                    });
                }
                Err(err) => {
                    let counter = match err {
                        TransportError::Dropped { .. } => CounterKind::Drop,
                        TransportError::Unreachable { .. } => CounterKind::Error,
                    };
                    self.count(&route.local, counter);
                    warn!(src = %msg.src, dst = %msg.dst, error = %err, "send attempt failed");
                }
            }
        }

        Err(CoreError::SendFailed {
            destination: nid,
            attempts,
        })
    }

    /// Send a GET and expect the peer to answer.
    pub fn ping(&self, transport: &dyn Transport, nid: Nid) -> Result<SendReport, CoreError> {
        self.send(transport, nid, MessageKind::Get)
    }

    /// Accept a message addressed to one of this node's NIDs.
    ///
    /// Counts `recv` on the addressed NI. A GET is answered: the reply is
    /// counted as a `send` on the same NI and returned.
    pub fn receive(&self, msg: &Message) -> Result<Option<Message>, CoreError> {
        let network = self.registry.resolve_network_for(&msg.dst)?;
        let up = network
            .interface_for(&msg.dst)
            .is_some_and(Interface::is_up);
        if !up {
            return Err(CoreError::UnknownNetwork {
                identifier: msg.dst.to_string(),
            });
        }

        self.counters.increment(&msg.dst, CounterKind::Recv)?;
        if msg.kind != MessageKind::Get {
            return Ok(None);
        }
        self.counters.increment(&msg.dst, CounterKind::Send)?;
        Ok(Some(Message {
            src: msg.dst,
            dst: msg.src,
            kind: MessageKind::Reply,
        }))
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Rotate the leading group of routes that tie on `(rank, rule index)`
    /// by the send sequence.
    fn balance(&self, routes: &mut [Route]) {
        if self.options.balance == Balance::Ordered {
            return;
        }
        let Some(lead) = routes.first().map(Route::sort_key) else {
            return;
        };
        let group = routes.iter().take_while(|r| r.sort_key() == lead).count();
        if group > 1 {
            let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
            routes[..group].rotate_left(seq % group);
        }
    }

    fn count(&self, nid: &Nid, kind: CounterKind) {
        // The NI can vanish if its network is torn down mid-send.
        if let Err(err) = self.counters.increment(nid, kind) {
            debug!(%nid, %kind, error = %err, "counter update skipped");
        }
    }
}

// ── NodeGuard ───────────────────────────────────────────────────────

/// Unconfigures the node on every exit path.
pub struct NodeGuard {
    node: Arc<Node>,
}

impl Deref for NodeGuard {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        self.node.unconfigure();
    }
}
