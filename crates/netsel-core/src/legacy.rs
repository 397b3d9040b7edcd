// ── Legacy statistics shape ──
//
// Serialization adapters that reproduce the YAML emitted by
// `lnetctl net show -v` and `lnetctl udsp show`, for tooling that still
// parses those dictionaries. Nothing inside the engine uses these types.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::counters::{CounterKind, CounterSnapshot};
use crate::model::{InstalledRule, Network, RuleAction};

/// Reported for NIs that are up; LNet's maximum health.
pub const HEALTH_MAX: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyNet {
    #[serde(rename = "net type")]
    pub net_type: String,
    #[serde(rename = "local NI(s)")]
    pub local_nis: Vec<LegacyNi>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyNi {
    pub nid: String,
    pub status: String,
    pub interfaces: BTreeMap<u32, String>,
    pub statistics: LegacyStatistics,
    #[serde(rename = "health stats")]
    pub health: LegacyHealth,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStatistics {
    pub send_count: u64,
    pub recv_count: u64,
    pub drop_count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyHealth {
    #[serde(rename = "health value")]
    pub health_value: u32,
    pub error: u64,
}

/// Build the `net show -v` list from a network snapshot and counter snapshot.
pub fn net_stats(networks: &[Arc<Network>], counters: &CounterSnapshot) -> Vec<LegacyNet> {
    networks
        .iter()
        .map(|network| LegacyNet {
            net_type: network.id.to_string(),
            local_nis: network
                .interfaces
                .iter()
                .map(|iface| {
                    let c = counters.ni(&iface.nid).unwrap_or_default();
                    LegacyNi {
                        nid: iface.nid.to_string(),
                        status: iface.state.to_string(),
                        interfaces: BTreeMap::from([(0, iface.name.clone())]),
                        statistics: LegacyStatistics {
                            send_count: c.send_count,
                            recv_count: c.recv_count,
                            drop_count: c.drop_count,
                        },
                        health: LegacyHealth {
                            health_value: if iface.is_up() { HEALTH_MAX } else { 0 },
                            error: c.error_count,
                        },
                    }
                })
                .collect(),
        })
        .collect()
}

/// Sum one statistic over the NIs of `net_type`.
pub fn stat_total(stats: &[LegacyNet], net_type: &str, kind: CounterKind) -> u64 {
    stats
        .iter()
        .filter(|net| net.net_type == net_type)
        .flat_map(|net| &net.local_nis)
        .map(|ni| match kind {
            CounterKind::Send => ni.statistics.send_count,
            CounterKind::Recv => ni.statistics.recv_count,
            CounterKind::Drop => ni.statistics.drop_count,
            CounterKind::Error => ni.health.error,
        })
        .sum()
}

pub fn send_count(stats: &[LegacyNet], net_type: &str) -> u64 {
    stat_total(stats, net_type, CounterKind::Send)
}

// ── udsp show ───────────────────────────────────────────────────────

/// `action:` block: either `priority: <n>` or `exclude: true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub exclude: bool,
}

impl LegacyAction {
    pub fn priority(rank: u32) -> Self {
        Self {
            priority: Some(rank),
            exclude: false,
        }
    }

    pub fn exclude() -> Self {
        Self {
            priority: None,
            exclude: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyUdsp {
    pub idx: usize,
    pub src: String,
    pub dst: String,
    pub action: LegacyAction,
}

/// Render rules in list order; `dst` reads `NA` when unset.
pub fn udsp_show(rules: &[Arc<InstalledRule>]) -> Vec<LegacyUdsp> {
    rules
        .iter()
        .enumerate()
        .map(|(idx, installed)| {
            let rule = &installed.rule;
            LegacyUdsp {
                idx,
                src: rule.src.to_string(),
                dst: rule
                    .dst
                    .as_ref()
                    .map_or_else(|| "NA".to_owned(), ToString::to_string),
                action: match rule.action {
                    RuleAction::Prefer => LegacyAction::priority(rule.rank(idx)),
                    RuleAction::Exclude => LegacyAction::exclude(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{InterfaceSpec, Rule};
    use crate::node::{Node, NodeOptions};
    use pretty_assertions::assert_eq;

    fn node() -> Node {
        let node = Node::new("main", NodeOptions::default());
        node.configure_net(
            "tcp".parse().unwrap(),
            &[InterfaceSpec::new("eth0", "10.0.0.1")],
        )
        .unwrap();
        node.configure_net(
            "tcp1".parse().unwrap(),
            &[
                InterfaceSpec::new("eth1", "10.1.0.1"),
                InterfaceSpec::new("eth2", "10.1.0.2"),
            ],
        )
        .unwrap();
        node
    }

    #[test]
    fn net_show_yaml_shape() {
        let node = node();
        node.counters()
            .increment(&"10.0.0.1@tcp".parse().unwrap(), CounterKind::Send)
            .unwrap();
        let stats = net_stats(&node.registry().networks(), &node.stats());
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&serde_yaml::to_string(&stats).unwrap()).unwrap();

        assert_eq!(yaml[0]["net type"], "tcp");
        let ni = &yaml[0]["local NI(s)"][0];
        assert_eq!(ni["nid"], "10.0.0.1@tcp");
        assert_eq!(ni["status"], "up");
        assert_eq!(ni["statistics"]["send_count"], 1);
        assert_eq!(ni["health stats"]["health value"], 1000);
        assert_eq!(stats[0].local_nis[0].interfaces[&0], "eth0");
        assert_eq!(yaml[1]["local NI(s)"].as_sequence().unwrap().len(), 2);
    }

    #[test]
    fn send_count_sums_one_net_type() {
        let node = node();
        for nid in ["10.1.0.1@tcp1", "10.1.0.2@tcp1", "10.1.0.2@tcp1"] {
            node.counters()
                .increment(&nid.parse().unwrap(), CounterKind::Send)
                .unwrap();
        }
        let stats = net_stats(&node.registry().networks(), &node.stats());
        assert_eq!(send_count(&stats, "tcp1"), 3);
        assert_eq!(send_count(&stats, "tcp"), 0);
        assert_eq!(send_count(&stats, "o2ib"), 0);
    }

    #[test]
    fn udsp_show_shape() {
        let node = node();
        node.add_rule(Rule::parse("tcp", None).unwrap()).unwrap();
        node.add_rule(
            Rule::parse("tcp1", Some("10.0.1.*@tcp1"))
                .unwrap()
                .with_priority(7),
        )
        .unwrap();
        node.add_rule(Rule::exclude("o2ib".parse().unwrap())).unwrap();

        let shown = udsp_show(&node.rules().list());
        assert_eq!(
            shown,
            vec![
                LegacyUdsp {
                    idx: 0,
                    src: "tcp".into(),
                    dst: "NA".into(),
                    action: LegacyAction::priority(0),
                },
                LegacyUdsp {
                    idx: 1,
                    src: "tcp1".into(),
                    dst: "10.0.1.*@tcp1".into(),
                    action: LegacyAction::priority(7),
                },
                LegacyUdsp {
                    idx: 2,
                    src: "o2ib".into(),
                    dst: "NA".into(),
                    action: LegacyAction::exclude(),
                },
            ]
        );
        let yaml = serde_yaml::to_string(&shown[0]).unwrap();
        assert!(yaml.contains("priority: 0"), "{yaml}");
        let yaml = serde_yaml::to_string(&shown[2]).unwrap();
        assert!(yaml.contains("exclude: true"), "{yaml}");
    }
}
