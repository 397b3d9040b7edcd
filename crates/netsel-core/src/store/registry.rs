// ── Network registry ──
//
// Locally configured networks and their interfaces. Readers get a
// lock-free `Arc` snapshot; writers are serialized and publish a fresh
// snapshot on every mutation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use crate::error::CoreError;
use crate::model::{Interface, InterfaceSpec, InterfaceState, NetId, Network, Nid};

/// Registry of local networks.
///
/// Every interface is claimed by at most one network. Claims live in a
/// `DashMap` so ownership checks never touch the snapshot.
pub struct NetworkRegistry {
    networks: ArcSwap<Vec<Arc<Network>>>,
    /// Interface name -> owning network.
    claims: DashMap<String, NetId>,
    writer: Mutex<()>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self {
            networks: ArcSwap::from_pointee(Vec::new()),
            claims: DashMap::new(),
            writer: Mutex::new(()),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Configure `net` on the given interfaces, claiming them exclusively.
    pub fn add_network(
        &self,
        net: NetId,
        interfaces: &[InterfaceSpec],
    ) -> Result<Arc<Network>, CoreError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        if self.network(net).is_some() {
            return Err(CoreError::DuplicateNetwork { net });
        }
        if interfaces.is_empty() {
            return Err(CoreError::Validation {
                message: format!("network {net} needs at least one interface"),
            });
        }

        let network = Arc::new(build_network(net, interfaces)?);
        self.claim_all(&network)?;

        self.networks.rcu(|current| {
            let mut next = Vec::clone(current);
            next.push(Arc::clone(&network));
            next
        });

        info!(
            %net,
            interfaces = network.interfaces.len(),
            "network configured"
        );
        Ok(network)
    }

    /// Tear down one network and release its interfaces.
    pub fn remove_network(&self, net: NetId) -> Result<Arc<Network>, CoreError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let removed = self.network(net).ok_or_else(|| CoreError::UnknownNetwork {
            identifier: net.to_string(),
        })?;

        self.networks.rcu(|current| {
            current
                .iter()
                .filter(|n| n.id != net)
                .cloned()
                .collect::<Vec<_>>()
        });
        for iface in &removed.interfaces {
            self.claims.remove(&iface.name);
        }

        info!(%net, "network removed");
        Ok(removed)
    }

    /// Tear down every network. Returns what was removed, in configuration order.
    pub fn remove_all(&self) -> Vec<Arc<Network>> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let removed = self.networks.swap(Arc::new(Vec::new()));
        self.claims.clear();
        if !removed.is_empty() {
            info!(count = removed.len(), "all networks removed");
        }
        Vec::clone(&removed)
    }

    /// Change the operational state of a configured interface.
    pub fn set_interface_state(&self, name: &str, state: InterfaceState) -> Result<(), CoreError> {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let net = self
            .owner_of(name)
            .ok_or_else(|| CoreError::UnknownInterface { name: name.into() })?;

        self.networks.rcu(|current| {
            current
                .iter()
                .map(|network| {
                    if network.id != net {
                        return Arc::clone(network);
                    }
                    let mut updated = Network::clone(network);
                    for iface in &mut updated.interfaces {
                        if iface.name == name {
                            iface.state = state;
                        }
                    }
                    Arc::new(updated)
                })
                .collect::<Vec<_>>()
        });

        info!(interface = name, %net, %state, "interface state changed");
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current networks, in configuration order (cheap `Arc` clone).
    pub fn networks(&self) -> Arc<Vec<Arc<Network>>> {
        self.networks.load_full()
    }

    pub fn network(&self, net: NetId) -> Option<Arc<Network>> {
        self.networks.load().iter().find(|n| n.id == net).cloned()
    }

    /// Every local NID: network order, then interface order.
    pub fn list_nids(&self) -> Vec<Nid> {
        self.networks
            .load()
            .iter()
            .flat_map(|network| network.nids().collect::<Vec<_>>())
            .collect()
    }

    /// The local network owning `nid`.
    pub fn resolve_network_for(&self, nid: &Nid) -> Result<Arc<Network>, CoreError> {
        self.network(nid.net)
            .filter(|network| network.contains(nid))
            .ok_or_else(|| CoreError::UnknownNetwork {
                identifier: nid.to_string(),
            })
    }

    /// Network currently claiming the interface, if any.
    pub fn owner_of(&self, interface: &str) -> Option<NetId> {
        self.claims.get(interface).map(|r| *r.value())
    }

    pub fn len(&self) -> usize {
        self.networks.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.load().is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Claim every interface of `network`, rolling back on the first conflict.
    fn claim_all(&self, network: &Network) -> Result<(), CoreError> {
        for (claimed, iface) in network.interfaces.iter().enumerate() {
            match self.claims.entry(iface.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(network.id);
                }
                Entry::Occupied(owner) => {
                    let owner = *owner.get();
                    for prior in &network.interfaces[..claimed] {
                        self.claims.remove(&prior.name);
                    }
                    return Err(CoreError::InterfaceInUse {
                        interface: iface.name.clone(),
                        net: owner,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_network(net: NetId, specs: &[InterfaceSpec]) -> Result<Network, CoreError> {
    let mut names = HashSet::new();
    let mut nids = HashSet::new();
    let mut interfaces = Vec::with_capacity(specs.len());

    for spec in specs {
        if !names.insert(spec.name.as_str()) {
            return Err(CoreError::InterfaceInUse {
                interface: spec.name.clone(),
                net,
            });
        }
        let nid = Nid::from_parts(&spec.address, net)?;
        if !nids.insert(nid) {
            return Err(CoreError::Validation {
                message: format!("NID {nid} is assigned to more than one interface"),
            });
        }
        interfaces.push(Interface {
            name: spec.name.clone(),
            net,
            nid,
            state: spec.state,
        });
    }

    Ok(Network {
        id: net,
        interfaces,
    })
}
