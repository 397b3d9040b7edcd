// ── Core error types ──
//
// Every failure the engine can report. None of them are fatal: callers
// decide whether a configuration error aborts node setup or whether a
// failed send is simply retried later.

use thiserror::Error;

use crate::model::{NetId, Nid};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Registry errors ──────────────────────────────────────────────
    #[error("Network {net} is already configured")]
    DuplicateNetwork { net: NetId },

    #[error("Network not found: {identifier}")]
    UnknownNetwork { identifier: String },

    #[error("Interface not found: {name}")]
    UnknownInterface { name: String },

    #[error("Interface {interface} already belongs to network {net}")]
    InterfaceInUse { interface: String, net: NetId },

    // ── Address errors ───────────────────────────────────────────────
    #[error("Invalid network '{input}': {reason}")]
    InvalidNet { input: String, reason: String },

    #[error("Invalid NID '{input}': {reason}")]
    InvalidNid { input: String, reason: String },

    // ── Rule errors ──────────────────────────────────────────────────
    #[error("Invalid rule: {reason}")]
    InvalidRule { reason: String },

    #[error("No rule at index {idx}")]
    RuleNotFound { idx: usize },

    // ── Selection / send errors ──────────────────────────────────────
    #[error("No route to {destination}")]
    NoRoute { destination: String },

    #[error("Send to {destination} failed after {attempts} attempt(s)")]
    SendFailed { destination: Nid, attempts: usize },

    #[error("Validation failed: {message}")]
    Validation { message: String },
}

impl CoreError {
    pub(crate) fn invalid_rule(reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            reason: reason.into(),
        }
    }
}
