//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use netsel_config::ConfigError;
use netsel_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const NO_ROUTE: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(netsel::not_found),
        help("Run: netsel {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' is already {state}")]
    #[diagnostic(code(netsel::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
        state: String,
    },

    // ── Selection ────────────────────────────────────────────────────
    #[error("No route to {destination}")]
    #[diagnostic(
        code(netsel::no_route),
        help(
            "No up local interface shares a network with the destination,\n\
             or every candidate is excluded by a policy.\n\
             Check: netsel net show  /  netsel udsp show"
        )
    )]
    NoRoute { destination: String },

    #[error("Send to {destination} failed after {attempts} attempt(s)")]
    #[diagnostic(
        code(netsel::send_failed),
        help("Every selected route failed. Run: netsel route {destination}")
    )]
    SendFailed { destination: String, attempts: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid rule: {reason}")]
    #[diagnostic(
        code(netsel::invalid_rule),
        help(
            "Selectors name a network (tcp, tcp1, tcp*, o2ib[1-3]) or NIDs\n\
             (10.0.0.[1-4]@tcp, 10.*.*.*@tcp1). Exclude policies take no priority."
        )
    )]
    InvalidRule { reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(netsel::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Could not load configuration")]
    #[diagnostic(
        code(netsel::config),
        help("Check the file given by --config / NETSEL_CONFIG, or run: netsel config path")
    )]
    Config(#[source] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(netsel::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::NoRoute { .. } => exit_code::NO_ROUTE,
            Self::InvalidRule { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::SendFailed { .. } | Self::Config(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateNetwork { net } => CliError::Conflict {
                resource_type: "network".into(),
                identifier: net.to_string(),
                state: "configured".into(),
            },

            CoreError::UnknownNetwork { identifier } => CliError::NotFound {
                resource_type: "network".into(),
                identifier,
                list_command: "net show".into(),
            },

            CoreError::UnknownInterface { name } => CliError::NotFound {
                resource_type: "interface".into(),
                identifier: name,
                list_command: "net show".into(),
            },

            CoreError::InterfaceInUse { interface, net } => CliError::Conflict {
                resource_type: "interface".into(),
                identifier: interface,
                state: format!("used by network {net}"),
            },

            CoreError::InvalidNet { input, reason } => CliError::Validation {
                field: "net".into(),
                reason: format!("'{input}': {reason}"),
            },

            CoreError::InvalidNid { input, reason } => CliError::Validation {
                field: "nid".into(),
                reason: format!("'{input}': {reason}"),
            },

            CoreError::InvalidRule { reason } => CliError::InvalidRule { reason },

            CoreError::RuleNotFound { idx } => CliError::NotFound {
                resource_type: "policy".into(),
                identifier: idx.to_string(),
                list_command: "udsp show".into(),
            },

            CoreError::NoRoute { destination } => CliError::NoRoute { destination },

            CoreError::SendFailed {
                destination,
                attempts,
            } => CliError::SendFailed {
                destination: destination.to_string(),
                attempts,
            },

            CoreError::Validation { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Core(core) => core.into(),
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(io) => CliError::Io(io),
            other => CliError::Config(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_exit_codes() {
        let cases = [
            (
                CoreError::DuplicateNetwork {
                    net: "tcp".parse().unwrap(),
                },
                exit_code::CONFLICT,
            ),
            (
                CoreError::UnknownNetwork {
                    identifier: "tcp9".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (CoreError::RuleNotFound { idx: 3 }, exit_code::NOT_FOUND),
            (
                CoreError::NoRoute {
                    destination: "1@gni".into(),
                },
                exit_code::NO_ROUTE,
            ),
            (
                CoreError::InvalidRule {
                    reason: "bad".into(),
                },
                exit_code::USAGE,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn wrapped_core_error_is_unwrapped() {
        let err: CliError = ConfigError::Core(CoreError::RuleNotFound { idx: 0 }).into();
        assert!(matches!(err, CliError::NotFound { .. }));
    }
}
