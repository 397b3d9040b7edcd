// ── Domain model ──
//
// Identity, topology and policy types shared by the registry, the rule
// store and the selection engine. Everything here is plain data.

pub mod network;
pub mod nid;
pub mod rule;
pub mod selector;

// ── Re-exports ──────────────────────────────────────────────────────

pub use network::{Interface, InterfaceSpec, InterfaceState, Network};
pub use nid::{LndType, NetId, Nid};
pub use rule::{InstalledRule, Rule, RuleAction, RuleId};
pub use selector::{AddrPattern, NetPattern, NumPattern, Selector};
