// ── Selection engine ──
//
// Pure function from (network snapshot, rule snapshot, destinations) to
// an ordered list of routes. Holds no state and takes no locks.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{InstalledRule, NetId, Network, Nid, RuleAction, RuleId};
use crate::store::ranked;

/// One way of reaching a destination: send from `local` to `remote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub net: NetId,
    pub local: Nid,
    pub interface: String,
    pub remote: Nid,
    /// Rank of the preferring rule; `None` when no rule preferred this route.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<RuleId>,
    /// List position of the preferring rule; breaks ties between equal ranks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_idx: Option<usize>,
}

impl Route {
    pub fn is_preferred(&self) -> bool {
        self.rank.is_some()
    }

    /// `(unpreferred, rank, rule index)`; preferred routes sort first.
    pub(crate) fn sort_key(&self) -> (bool, u32, usize) {
        match (self.rank, self.rule_idx) {
            (Some(rank), idx) => (false, rank, idx.unwrap_or_default()),
            (None, _) => (true, 0, 0),
        }
    }
}

/// Compute the attempt order for reaching any of `destinations`.
///
/// Candidates are every up local interface on the same network as a
/// destination NID, in destination order then interface order. Any
/// matching `exclude` rule drops a candidate, whatever its rank. Among the
/// rest, the first matching `prefer` rule in `(rank, index)` order tags
/// the candidate. Preferred routes come first by `(rank, index)`;
/// everything else keeps the base order.
///
/// Returns [`CoreError::NoRoute`] when no candidate exists or every
/// candidate was excluded.
pub fn select_route(
    networks: &[Arc<Network>],
    rules: &[Arc<InstalledRule>],
    destinations: &[Nid],
) -> Result<Vec<Route>, CoreError> {
    let no_route = || CoreError::NoRoute {
        destination: describe(destinations),
    };

    let candidates = candidates(networks, destinations);
    if candidates.is_empty() {
        debug!(destination = %describe(destinations), "no directly connected network");
        return Err(no_route());
    }

    let ranked = ranked(rules);
    let mut excluded = 0usize;
    let mut routes = Vec::with_capacity(candidates.len());

    for mut route in candidates {
        let (local, remote) = (route.local, route.remote);
        let mut matching = ranked
            .iter()
            .filter(|r| r.rule.rule.matches(&local, &remote));

        if matching
            .clone()
            .any(|r| r.rule.rule.action == RuleAction::Exclude)
        {
            excluded += 1;
            continue;
        }
        if let Some(r) = matching.next() {
            route.rank = Some(r.rank);
            route.rule = Some(r.rule.id);
            route.rule_idx = Some(r.idx);
        }
        routes.push(route);
    }

    if routes.is_empty() {
        debug!(destination = %describe(destinations), excluded, "every candidate excluded");
        return Err(no_route());
    }

    // Stable: equal keys keep destination/interface order.
    routes.sort_by_key(Route::sort_key);

    debug!(
        destination = %describe(destinations),
        routes = routes.len(),
        excluded,
        first = %routes[0].local,
        "route selected"
    );
    Ok(routes)
}

fn candidates(networks: &[Arc<Network>], destinations: &[Nid]) -> Vec<Route> {
    let mut out = Vec::new();
    for remote in destinations {
        let Some(network) = networks.iter().find(|n| n.id == remote.net) else {
            continue;
        };
        out.extend(
            network
                .interfaces
                .iter()
                .filter(|iface| iface.is_up())
                .map(|iface| Route {
                    net: network.id,
                    local: iface.nid,
                    interface: iface.name.clone(),
                    remote: *remote,
                    rank: None,
                    rule: None,
                    rule_idx: None,
                }),
        );
    }
    out
}

fn describe(destinations: &[Nid]) -> String {
    match destinations {
        [] => "<no destination>".into(),
        [one] => one.to_string(),
        many => many
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{InterfaceSpec, InterfaceState, Rule};
    use crate::store::{NetworkRegistry, RuleStore};
    use pretty_assertions::assert_eq;

    fn nid(s: &str) -> Nid {
        s.parse().unwrap()
    }

    /// tcp on eth0/eth1, tcp1 on eth2/eth3.
    fn registry() -> NetworkRegistry {
        let reg = NetworkRegistry::new();
        reg.add_network(
            "tcp".parse().unwrap(),
            &[
                InterfaceSpec::new("eth0", "10.0.0.1"),
                InterfaceSpec::new("eth1", "10.0.0.2"),
            ],
        )
        .unwrap();
        reg.add_network(
            "tcp1".parse().unwrap(),
            &[
                InterfaceSpec::new("eth2", "10.1.0.1"),
                InterfaceSpec::new("eth3", "10.1.0.2"),
            ],
        )
        .unwrap();
        reg
    }

    fn peer() -> Vec<Nid> {
        vec![nid("10.1.1.1@tcp1"), nid("10.0.1.1@tcp")]
    }

    fn locals(routes: &[Route]) -> Vec<String> {
        routes.iter().map(|r| r.local.to_string()).collect()
    }

    #[test]
    fn no_rules_keeps_base_order() {
        let reg = registry();
        let routes = select_route(&reg.networks(), &[], &peer()).unwrap();
        assert_eq!(
            locals(&routes),
            vec!["10.1.0.1@tcp1", "10.1.0.2@tcp1", "10.0.0.1@tcp", "10.0.0.2@tcp"]
        );
        assert!(routes.iter().all(|r| !r.is_preferred()));
    }

    #[test]
    fn prefer_rule_moves_network_first() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::parse("tcp", None).unwrap()).unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(
            locals(&routes),
            vec!["10.0.0.1@tcp", "10.0.0.2@tcp", "10.1.0.1@tcp1", "10.1.0.2@tcp1"]
        );
        assert_eq!(routes[0].rank, Some(0));
        assert_eq!(routes[0].remote, nid("10.0.1.1@tcp"));
    }

    #[test]
    fn lower_rank_wins_across_rules() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::parse("tcp", None).unwrap()).unwrap();
        rules
            .add(Rule::parse("tcp1", None).unwrap().with_priority(0))
            .unwrap();
        // tcp has rank 0 idx 0, tcp1 has rank 0 idx 1: tcp still first.
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(routes[0].net, "tcp".parse().unwrap());

        rules.remove(0).unwrap();
        rules
            .insert(0, Rule::parse("tcp", None).unwrap().with_priority(3))
            .unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(routes[0].net, "tcp1".parse().unwrap());
    }

    #[test]
    fn exclude_before_prefer_drops_the_ni() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::exclude("10.0.0.2@tcp".parse().unwrap())).unwrap();
        rules.add(Rule::parse("tcp", None).unwrap()).unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(
            locals(&routes),
            vec!["10.0.0.1@tcp", "10.1.0.1@tcp1", "10.1.0.2@tcp1"]
        );
        assert_eq!(routes[0].rank, Some(1));
    }

    #[test]
    fn exclude_after_prefer_still_drops_the_ni() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::parse("tcp", None).unwrap()).unwrap();
        rules.add(Rule::exclude("10.0.0.2@tcp".parse().unwrap())).unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(
            locals(&routes),
            vec!["10.0.0.1@tcp", "10.1.0.1@tcp1", "10.1.0.2@tcp1"]
        );
        assert_eq!(routes[0].rank, Some(0));
        assert!(!locals(&routes).contains(&"10.0.0.2@tcp".to_owned()));
    }

    #[test]
    fn equal_rank_ties_go_to_the_earlier_rule() {
        let reg = registry();
        let rules = RuleStore::new();
        // Base order puts tcp1 first (peer lists its tcp1 NID first).
        rules
            .add(Rule::parse("tcp", None).unwrap().with_priority(2))
            .unwrap();
        rules
            .add(Rule::parse("tcp1", None).unwrap().with_priority(2))
            .unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert_eq!(
            locals(&routes),
            vec!["10.0.0.1@tcp", "10.0.0.2@tcp", "10.1.0.1@tcp1", "10.1.0.2@tcp1"]
        );
        assert_eq!(routes[0].rule_idx, Some(0));
        assert_eq!(routes[2].rule_idx, Some(1));
    }

    #[test]
    fn dst_selector_limits_preference() {
        let reg = registry();
        let rules = RuleStore::new();
        rules
            .add(Rule::parse("tcp", Some("10.0.9.*@tcp")).unwrap())
            .unwrap();
        let routes = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        assert!(routes.iter().all(|r| !r.is_preferred()));
    }

    #[test]
    fn down_interfaces_are_skipped() {
        let reg = registry();
        reg.set_interface_state("eth2", InterfaceState::Down).unwrap();
        let routes = select_route(&reg.networks(), &[], &peer()).unwrap();
        assert!(!locals(&routes).contains(&"10.1.0.1@tcp1".to_owned()));
        assert_eq!(routes.len(), 3);
    }

    #[test]
    fn unreachable_destination_is_no_route() {
        let reg = registry();
        let err = select_route(&reg.networks(), &[], &[nid("5@gni")]).unwrap_err();
        assert!(matches!(err, CoreError::NoRoute { ref destination } if destination == "5@gni"));
        assert!(matches!(
            select_route(&[], &[], &peer()),
            Err(CoreError::NoRoute { .. })
        ));
    }

    #[test]
    fn excluding_everything_is_no_route() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::exclude("tcp*".parse().unwrap())).unwrap();
        assert!(matches!(
            select_route(&reg.networks(), &rules.list(), &peer()),
            Err(CoreError::NoRoute { .. })
        ));
    }

    #[test]
    fn repeated_selection_is_identical() {
        let reg = registry();
        let rules = RuleStore::new();
        rules.add(Rule::parse("tcp1", None).unwrap()).unwrap();
        let first = select_route(&reg.networks(), &rules.list(), &peer()).unwrap();
        for _ in 0..50 {
            assert_eq!(
                select_route(&reg.networks(), &rules.list(), &peer()).unwrap(),
                first
            );
        }
    }
}
