//! Shared helpers for command handlers.

use std::sync::Arc;

use netsel_core::{Fabric, InterfaceState, NetId, Network, Nid};

use crate::cli::StateArg;
use crate::config::{Session, build_fabric};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to prompt on, the action is refused rather than
/// silently approved.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|_| CliError::NonInteractiveRequiresYes {
            action: action.into(),
        })
}

pub fn parse_net(raw: &str) -> Result<NetId, CliError> {
    Ok(raw.parse::<NetId>()?)
}

pub fn parse_nid(raw: &str) -> Result<Nid, CliError> {
    Ok(raw.parse::<Nid>()?)
}

pub fn parse_nids(raw: &[String]) -> Result<Vec<Nid>, CliError> {
    raw.iter().map(|s| parse_nid(s)).collect()
}

pub fn interface_state(arg: StateArg) -> InterfaceState {
    match arg {
        StateArg::Up => InterfaceState::Up,
        StateArg::Down => InterfaceState::Down,
    }
}

/// Fabric holding the session node and every configured peer, with the
/// destination's NIDs discovered into the node's peer table.
pub fn fabric_for(session: &Session, destination: Nid) -> Result<Fabric, CliError> {
    let fabric = build_fabric(&session.config, &session.node)?;
    let nids = session.node.discover(&fabric, destination);
    tracing::debug!(%destination, peers = nids.len(), "peer NIDs resolved");
    Ok(fabric)
}

/// Configured networks, or only `--net` when given. An unconfigured
/// `--net` is `NotFound`.
pub fn select_networks(session: &Session, net: Option<&str>) -> Result<Vec<Arc<Network>>, CliError> {
    let networks = session.node.registry().networks();
    let Some(raw) = net else {
        return Ok(Vec::clone(&networks));
    };
    let net = parse_net(raw)?;
    let selected: Vec<Arc<Network>> = networks.iter().filter(|n| n.id == net).cloned().collect();
    if selected.is_empty() {
        return Err(CliError::NotFound {
            resource_type: "network".into(),
            identifier: net.to_string(),
            list_command: "net show".into(),
        });
    }
    Ok(selected)
}
