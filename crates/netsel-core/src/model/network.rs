// ── Network domain types ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::nid::{NetId, Nid};

/// Operational state of an interface. Down interfaces never carry traffic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InterfaceState {
    #[default]
    Up,
    Down,
}

/// An enumerated device as handed to the registry.
///
/// The address is kept in its text form and interpreted according to
/// the LND of the network the interface joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub state: InterfaceState,
}

impl InterfaceSpec {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            state: InterfaceState::Up,
        }
    }
}

/// A configured network interface (one NI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    /// Owning network.
    pub net: NetId,
    pub nid: Nid,
    pub state: InterfaceState,
}

impl Interface {
    pub fn is_up(&self) -> bool {
        self.state == InterfaceState::Up
    }
}

/// A locally configured network and its interfaces, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub id: NetId,
    pub interfaces: Vec<Interface>,
}

impl Network {
    /// Local NIDs in interface order.
    pub fn nids(&self) -> impl Iterator<Item = Nid> + '_ {
        self.interfaces.iter().map(|iface| iface.nid)
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    pub fn interface_for(&self, nid: &Nid) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.nid == *nid)
    }

    pub fn contains(&self, nid: &Nid) -> bool {
        self.interface_for(nid).is_some()
    }
}
