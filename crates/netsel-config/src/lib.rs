//! Node configuration for netsel.
//!
//! A TOML description of one node (interfaces, networks, rules, peers)
//! layered through figment, written back by mutating CLI commands, and
//! translated into a configured `netsel_core::Node`.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use netsel_core::{
    Balance, CoreError, Fabric, InterfaceSpec, InterfaceState, NetId, Nid, Node, NodeOptions, Rule,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeSection,

    /// Global output defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Devices available to networks.
    #[serde(default)]
    pub interfaces: Vec<InterfaceSpec>,

    #[serde(default)]
    pub networks: Vec<NetworkEntry>,

    /// Selection rules in list order.
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Known peers; also simulated by `ping`.
    #[serde(default)]
    pub peers: Vec<PeerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeSection {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_discovery")]
    pub discovery: bool,

    #[serde(default)]
    pub balance: Balance,
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            discovery: default_discovery(),
            balance: Balance::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_name() -> String {
    "main".into()
}
fn default_discovery() -> bool {
    true
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A network and the interfaces it is configured on, by name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkEntry {
    pub net: NetId,
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeerEntry {
    pub name: String,
    pub nids: Vec<Nid>,
}

// ── Config editing ──────────────────────────────────────────────────

impl Config {
    pub fn interface(&self, name: &str) -> Option<&InterfaceSpec> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Resolve `--if` arguments. Each is either a known interface name or
    /// `name=address`, which declares (or readdresses) the interface.
    pub fn claim_interfaces(&mut self, args: &[String]) -> Result<Vec<InterfaceSpec>, ConfigError> {
        let mut specs = Vec::with_capacity(args.len());
        for arg in args {
            let spec = match arg.split_once('=') {
                Some((name, address)) => {
                    let spec = InterfaceSpec::new(name.trim(), address.trim());
                    match self.interfaces.iter_mut().find(|i| i.name == spec.name) {
                        Some(existing) => existing.address.clone_from(&spec.address),
                        None => self.interfaces.push(spec.clone()),
                    }
                    spec
                }
                None => self.interface(arg.trim()).cloned().ok_or_else(|| {
                    invalid(
                        "interfaces",
                        format!("unknown interface '{arg}' (declare it as {arg}=<address>)"),
                    )
                })?,
            };
            specs.push(spec);
        }
        Ok(specs)
    }

    /// Record node state that CLI commands can change: networks,
    /// interface states and rules.
    pub fn sync_from(&mut self, node: &Node) {
        let networks = node.registry().networks();
        self.networks = networks
            .iter()
            .map(|n| NetworkEntry {
                net: n.id,
                interfaces: n.interfaces.iter().map(|i| i.name.clone()).collect(),
            })
            .collect();

        let states: BTreeMap<&str, InterfaceState> = networks
            .iter()
            .flat_map(|n| n.interfaces.iter())
            .map(|i| (i.name.as_str(), i.state))
            .collect();
        for spec in &mut self.interfaces {
            if let Some(state) = states.get(spec.name.as_str()) {
                spec.state = *state;
            }
        }

        self.rules = node
            .rules()
            .list()
            .iter()
            .map(|installed| installed.rule.clone())
            .collect();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for spec in &self.interfaces {
            if !names.insert(spec.name.as_str()) {
                return Err(invalid(
                    "interfaces",
                    format!("interface '{}' is declared twice", spec.name),
                ));
            }
        }
        for entry in &self.networks {
            if let Some(missing) = entry.interfaces.iter().find(|n| self.interface(n).is_none()) {
                return Err(invalid(
                    "networks",
                    format!("network {} uses undeclared interface '{missing}'", entry.net),
                ));
            }
        }
        let mut peers = HashSet::new();
        let mut peer_nids = HashSet::new();
        for peer in &self.peers {
            if let Some(dup) = peer.nids.iter().find(|nid| !peer_nids.insert(**nid)) {
                return Err(invalid(
                    "peers",
                    format!("peer NID {dup} is listed more than once"),
                ));
            }
            if !peers.insert(peer.name.as_str()) {
                return Err(invalid(
                    "peers",
                    format!("peer '{}' is declared twice", peer.name),
                ));
            }
            if peer.nids.is_empty() {
                return Err(invalid(
                    "peers",
                    format!("peer '{}' has no NIDs", peer.name),
                ));
            }
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "netsel", "netsel").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("netsel");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from defaults, the file at `path`, then `NETSEL_*` env.
///
/// A missing file is not an error; nested keys use `__`
/// (`NETSEL_NODE__BALANCE=ordered`).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NETSEL_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    debug!(path = %path.display(), networks = config.networks.len(), "config loaded");
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Node construction ───────────────────────────────────────────────

/// Configure a fresh node from `cfg`.
pub fn build_node(cfg: &Config) -> Result<Arc<Node>, ConfigError> {
    cfg.validate()?;
    let node = Arc::new(Node::new(
        cfg.node.name.clone(),
        NodeOptions {
            discovery: cfg.node.discovery,
            balance: cfg.node.balance,
        },
    ));

    for entry in &cfg.networks {
        let specs: Vec<InterfaceSpec> = entry
            .interfaces
            .iter()
            .filter_map(|name| cfg.interface(name).cloned())
            .collect();
        node.configure_net(entry.net, &specs)?;
    }
    for rule in &cfg.rules {
        node.add_rule(rule.clone())?;
    }
    for peer in &cfg.peers {
        node.add_peer(peer.nids.clone());
    }
    Ok(node)
}

/// Build an in-memory fabric holding `node` and one simulated node per
/// configured peer. Each peer NID gets its own synthetic interface.
pub fn build_fabric(cfg: &Config, node: &Arc<Node>) -> Result<Fabric, ConfigError> {
    let fabric = Fabric::new();
    fabric.attach(node);

    for peer in &cfg.peers {
        let sim = Arc::new(Node::new(peer.name.clone(), NodeOptions::default()));
        let mut by_net: BTreeMap<NetId, Vec<InterfaceSpec>> = BTreeMap::new();
        for (i, nid) in peer.nids.iter().enumerate() {
            by_net
                .entry(nid.net)
                .or_default()
                .push(InterfaceSpec::new(format!("{}-if{i}", peer.name), nid.host()));
        }
        for (net, specs) in &by_net {
            sim.configure_net(*net, specs)?;
        }
        fabric.attach(&sim);
    }
    Ok(fabric)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use netsel_core::Discovery;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[node]
name = "main"
balance = "ordered"

[[interfaces]]
name = "eth0"
address = "10.0.0.1"

[[interfaces]]
name = "eth1"
address = "10.1.0.1"
state = "down"

[[networks]]
net = "tcp"
interfaces = ["eth0"]

[[networks]]
net = "tcp1"
interfaces = ["eth1"]

[[rules]]
src = "tcp"

[[rules]]
src = "tcp1"
dst = "10.1.1.*@tcp1"
priority = 4

[[peers]]
name = "agent"
nids = ["10.0.1.1@tcp", "10.1.1.1@tcp1"]
"#;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.node.name, "main");
        assert!(cfg.node.discovery);
        assert_eq!(cfg.defaults.output, "table");
        assert!(cfg.networks.is_empty());
    }

    #[test]
    fn sample_loads_and_builds() {
        let (_dir, path) = write(SAMPLE);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.node.balance, Balance::Ordered);
        assert_eq!(cfg.interfaces[1].state, InterfaceState::Down);
        assert_eq!(cfg.rules[1].priority, Some(4));

        let node = build_node(&cfg).unwrap();
        assert_eq!(node.list_nids().len(), 2);
        assert_eq!(node.rules().len(), 2);
        assert_eq!(node.peers().len(), 1);
        let tcp1 = node.registry().network("tcp1".parse().unwrap()).unwrap();
        assert!(!tcp1.interfaces[0].is_up());
    }

    #[test]
    fn undeclared_interface_is_rejected() {
        let (_dir, path) = write(
            r#"
[[networks]]
net = "tcp"
interfaces = ["eth7"]
"#,
        );
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation { ref field, .. }) if field == "networks"
        ));
    }

    #[test]
    fn peer_nid_listed_twice_is_rejected() {
        let (_dir, path) = write(
            r#"
[[peers]]
name = "agent"
nids = ["10.0.1.1@tcp"]

[[peers]]
name = "router"
nids = ["10.1.1.1@tcp1", "10.0.1.1@tcp"]
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, ref reason }
                if field == "peers" && reason.contains("10.0.1.1@tcp")),
            "{err}"
        );

        let mut cfg = Config::default();
        cfg.peers.push(PeerEntry {
            name: "agent".into(),
            nids: vec!["10.0.1.1@tcp".parse().unwrap(), "10.0.1.1@tcp".parse().unwrap()],
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn shared_interface_surfaces_core_error() {
        let (_dir, path) = write(
            r#"
[[interfaces]]
name = "eth0"
address = "10.0.0.1"

[[networks]]
net = "tcp"
interfaces = ["eth0"]

[[networks]]
net = "tcp1"
interfaces = ["eth0"]
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert!(matches!(
            build_node(&cfg),
            Err(ConfigError::Core(CoreError::InterfaceInUse { .. }))
        ));
    }

    #[test]
    fn malformed_rule_fails_to_load() {
        let (_dir, path) = write("[[rules]]\nsrc = \"bogus\"\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn save_then_load_preserves_config() {
        let (dir, path) = write(SAMPLE);
        let cfg = load_config(&path).unwrap();
        let out = dir.path().join("nested").join("saved.toml");
        save_config(&cfg, &out).unwrap();
        assert_eq!(load_config(&out).unwrap(), cfg);
    }

    #[test]
    fn claim_interfaces_declares_new_devices() {
        let mut cfg = Config::default();
        let specs = cfg
            .claim_interfaces(&["eth0=10.0.0.1".into(), "eth0".into()])
            .unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(cfg.interfaces.len(), 1);
        assert!(matches!(
            cfg.claim_interfaces(&["eth9".into()]),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn sync_from_captures_node_changes() {
        let (_dir, path) = write(SAMPLE);
        let mut cfg = load_config(&path).unwrap();
        let node = build_node(&cfg).unwrap();
        node.unconfigure_net("tcp".parse().unwrap()).unwrap();
        node.set_interface_state("eth1", InterfaceState::Up).unwrap();
        node.rules().clear();

        cfg.sync_from(&node);
        assert_eq!(cfg.networks.len(), 1);
        assert_eq!(cfg.interfaces[1].state, InterfaceState::Up);
        assert!(cfg.rules.is_empty());
        // Interfaces outside any network stay declared.
        assert!(cfg.interface("eth0").is_some());
    }

    #[test]
    fn fabric_simulates_peers() {
        let (_dir, path) = write(SAMPLE);
        let cfg = load_config(&path).unwrap();
        let node = build_node(&cfg).unwrap();
        let fabric = build_fabric(&cfg, &node).unwrap();

        let peer: Nid = "10.0.1.1@tcp".parse().unwrap();
        assert_eq!(fabric.discover(&peer).len(), 2);
        let report = node.ping(&fabric, peer).unwrap();
        assert_eq!(report.route.net, "tcp".parse().unwrap());
    }
}
