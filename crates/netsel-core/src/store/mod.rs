// ── Local state stores ──
//
// Both stores publish immutable `Arc` snapshots that the selection
// engine reads without locking.

mod registry;
mod rules;

pub use registry::NetworkRegistry;
pub use rules::{RankedRule, RuleStore, ranked};
