//! Source/destination network selection for multi-rail nodes.
//!
//! This crate owns the domain model, local state and selection logic of
//! a node with several interfaces grouped into networks:
//!
//! - **[`NetworkRegistry`]**: locally configured networks. Each interface
//!   belongs to exactly one network and yields one local NID. Readers get
//!   lock-free `arc-swap` snapshots.
//!
//! - **[`RuleStore`]**: ordered user-defined selection policies (UDSPs).
//!   A rule's rank is its explicit priority, otherwise its list index.
//!
//! - **[`select_route()`]**: pure function from registry and rule
//!   snapshots plus a set of destination NIDs to the ordered list of
//!   [`Route`]s to attempt.
//!
//! - **[`TrafficCounters`]**: per-NI send/recv/drop/error counters with
//!   tear-free [`CounterSnapshot`]s for before/after comparisons.
//!
//! - **[`Node`]**: facade tying the above together with a peer table and
//!   the [`Transport`] / [`Discovery`] seams. [`Fabric`] is an in-memory
//!   implementation of both for tests and simulations.
//!
//! - **[`legacy`]**: adapters producing the `lnetctl net show -v` and
//!   `udsp show` dictionary shapes.

pub mod counters;
pub mod error;
pub mod fabric;
pub mod legacy;
pub mod model;
pub mod node;
pub mod select;
pub mod store;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use counters::{CounterKind, CounterSnapshot, NiCounters, TrafficCounters};
pub use error::CoreError;
pub use fabric::Fabric;
pub use node::{Balance, Node, NodeGuard, NodeOptions, SendReport};
pub use select::{Route, select_route};
pub use store::{NetworkRegistry, RankedRule, RuleStore};
pub use transport::{Delivery, Discovery, Message, MessageKind, Transport, TransportError};

pub use model::{
    AddrPattern, InstalledRule, Interface, InterfaceSpec, InterfaceState, LndType, NetId,
    NetPattern, Network, Nid, NumPattern, Rule, RuleAction, RuleId, Selector,
};
