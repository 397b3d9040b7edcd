//! Integration tests for the `netsel` CLI binary.
//!
//! Every test points `NETSEL_CONFIG` at a file in its own temp directory,
//! so state carries between invocations within a test and never touches
//! the user's real configuration.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use pretty_assertions::assert_eq;

// ── Helpers ─────────────────────────────────────────────────────────

struct Workspace {
    _dir: tempfile::TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("node.toml");
        Self { _dir: dir, config }
    }

    /// Build a [`Command`] for the `netsel` binary with env isolation.
    fn cmd(&self) -> assert_cmd::Command {
        netsel_cmd(&self.config)
    }

    /// Run `args` and require success.
    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(["-o", "json"]).args(args).output().unwrap();
        assert!(output.status.success(), "{}", combined_output(&output));
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Two rails: eth0 on tcp, eth1 on tcp1, and a peer on both.
    fn two_rails(&self) {
        self.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
        self.run(&["net", "add", "--net", "tcp1", "--if", "eth1=10.1.0.1"]);
        self.run(&[
            "peer",
            "add",
            "--name",
            "agent",
            "--nid",
            "10.0.1.1@tcp,10.1.1.1@tcp1",
        ]);
    }
}

fn netsel_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netsel");
    cmd.env("HOME", "/tmp/netsel-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netsel-cli-test-nonexistent")
        .env("NETSEL_CONFIG", config)
        .env_remove("NETSEL_OUTPUT")
        .env_remove("NETSEL_NODE__NAME")
        .env_remove("NETSEL_NODE__DISCOVERY")
        .env_remove("NETSEL_NODE__BALANCE")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let ws = Workspace::new();
    let output = ws.cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    Workspace::new().cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("net")
            .and(predicate::str::contains("udsp"))
            .and(predicate::str::contains("ping")),
    );
}

#[test]
fn test_completions_zsh() {
    Workspace::new()
        .cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_config_path_follows_env() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("node.toml"));
}

// ── net ─────────────────────────────────────────────────────────────

#[test]
fn test_net_add_persists_and_shows() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1,eth1=10.0.0.2"]);

    let shown = ws.json(&["net", "show"]);
    let nids: Vec<&str> = shown
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["nid"].as_str().unwrap())
        .collect();
    assert_eq!(nids, vec!["10.0.0.1@tcp", "10.0.0.2@tcp"]);

    let toml = std::fs::read_to_string(&ws.config).unwrap();
    assert!(toml.contains("eth1"), "{toml}");
}

#[test]
fn test_net_add_duplicate_is_conflict() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
    ws.cmd()
        .args(["net", "add", "--net", "tcp", "--if", "eth1=10.0.0.2"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("already"));
}

#[test]
fn test_interface_cannot_join_two_networks() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
    ws.cmd()
        .args(["net", "add", "--net", "tcp1", "--if", "eth0"])
        .assert()
        .code(6);
}

#[test]
fn test_net_del_unknown_is_not_found() {
    Workspace::new()
        .cmd()
        .args(["net", "del", "--net", "o2ib"])
        .assert()
        .code(4);
}

#[test]
fn test_bad_network_name_is_usage_error() {
    Workspace::new()
        .cmd()
        .args(["net", "add", "--net", "ethernet", "--if", "eth0=10.0.0.1"])
        .assert()
        .code(2);
}

#[test]
fn test_net_show_detail_uses_legacy_keys() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
    ws.cmd()
        .args(["net", "show", "--detail"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("net type: tcp")
                .and(predicate::str::contains("send_count: 0"))
                .and(predicate::str::contains("health value: 1000")),
        );
}

#[test]
fn test_set_state_down_removes_route() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.run(&["net", "set-state", "--if", "eth0", "down"]);

    let routes = ws.json(&["route", "10.0.1.1@tcp"]);
    let locals: Vec<&str> = routes
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["local"].as_str().unwrap())
        .collect();
    assert_eq!(locals, vec!["10.1.0.1@tcp1"]);
}

// ── udsp ────────────────────────────────────────────────────────────

#[test]
fn test_udsp_add_and_show() {
    let ws = Workspace::new();
    ws.run(&["udsp", "add", "--src", "tcp"]);
    ws.run(&["udsp", "add", "--src", "o2ib", "--exclude"]);
    ws.run(&["udsp", "add", "--src", "tcp1", "--priority", "7", "--idx", "0"]);

    let shown = ws.json(&["udsp", "show"]);
    assert_eq!(
        shown,
        serde_json::json!([
            {"idx": 0, "src": "tcp1", "dst": "NA", "action": {"priority": 7}},
            {"idx": 1, "src": "tcp", "dst": "NA", "action": {"priority": 1}},
            {"idx": 2, "src": "o2ib", "dst": "NA", "action": {"exclude": true}},
        ])
    );
}

#[test]
fn test_udsp_invalid_rule_is_usage_error() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["udsp", "add", "--src", "10.0.0.[9-1]@tcp"])
        .assert()
        .code(2);
    ws.cmd()
        .args(["udsp", "add", "--src", "tcp", "--exclude", "--priority", "1"])
        .assert()
        .code(2);
}

#[test]
fn test_udsp_del_needs_exactly_one_target() {
    let ws = Workspace::new();
    ws.cmd().args(["udsp", "del"]).assert().code(2);
    ws.cmd()
        .args(["udsp", "del", "--idx", "0", "--all"])
        .assert()
        .code(2);
}

#[test]
fn test_udsp_del_all_requires_yes_without_terminal() {
    let ws = Workspace::new();
    ws.run(&["udsp", "add", "--src", "tcp"]);
    ws.cmd()
        .args(["udsp", "del", "--all"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    ws.run(&["udsp", "del", "--all", "--yes"]);
    assert_eq!(ws.json(&["udsp", "show"]), serde_json::json!([]));
}

#[test]
fn test_udsp_del_missing_index_is_not_found() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["udsp", "del", "--idx", "3"])
        .assert()
        .code(4);
}

// ── route / ping ────────────────────────────────────────────────────

#[test]
fn test_route_puts_preferred_network_first() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.run(&["udsp", "add", "--src", "tcp1"]);

    let routes = ws.json(&["route", "10.0.1.1@tcp"]);
    let first = &routes.as_array().unwrap()[0];
    assert_eq!(first["local"], "10.1.0.1@tcp1");
    assert_eq!(first["remote"], "10.1.1.1@tcp1");
    assert_eq!(first["rank"], 0);
    assert_eq!(routes.as_array().unwrap().len(), 2);
}

#[test]
fn test_route_table_numbers_rows_in_attempt_order() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.run(&["udsp", "add", "--src", "tcp1"]);

    let output = ws.cmd().args(["route", "10.0.1.1@tcp"]).output().unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let table = String::from_utf8_lossy(&output.stdout);
    let first = table.find("10.1.0.1@tcp1").unwrap();
    let second = table.find("10.0.0.1@tcp ").unwrap();
    assert!(first < second, "{table}");
}

#[test]
fn test_exclude_added_after_prefer_still_applies() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1,eth1=10.0.0.2"]);
    ws.run(&["udsp", "add", "--src", "tcp"]);
    ws.run(&["udsp", "add", "--src", "10.0.0.2@tcp", "--exclude"]);

    let routes = ws.json(&["route", "10.0.1.1@tcp"]);
    let locals: Vec<&str> = routes
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["local"].as_str().unwrap())
        .collect();
    assert_eq!(locals, vec!["10.0.0.1@tcp"]);
}

#[test]
fn test_ping_follows_prefer_rule() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.run(&["udsp", "add", "--src", "tcp"]);

    let summary = ws.json(&["ping", "10.1.1.1@tcp1", "-c", "4"]);
    assert_eq!(summary["replies"].as_array().unwrap().len(), 4);
    assert_eq!(summary["delta"]["tcp"]["send_count"], 4);
    assert_eq!(summary["delta"]["tcp"]["recv_count"], 4);
    assert_eq!(summary["delta"]["tcp1"]["send_count"], 0);
}

#[test]
fn test_ping_without_shared_network_is_no_route() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.cmd()
        .args(["ping", "10.9.9.9@o2ib"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("No route"));
}

#[test]
fn test_excluding_every_rail_is_no_route() {
    let ws = Workspace::new();
    ws.two_rails();
    ws.run(&["udsp", "add", "--src", "tcp", "--exclude"]);
    ws.run(&["udsp", "add", "--src", "tcp1", "--exclude"]);
    ws.cmd().args(["route", "10.0.1.1@tcp"]).assert().code(7);
}

#[test]
fn test_ping_unknown_peer_fails_send() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
    ws.cmd()
        .args(["ping", "10.0.5.5@tcp"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed after 1 attempt"));
}

// ── stats ───────────────────────────────────────────────────────────

#[test]
fn test_stats_show_unknown_net_is_not_found() {
    let ws = Workspace::new();
    ws.run(&["net", "add", "--net", "tcp", "--if", "eth0=10.0.0.1"]);
    ws.cmd()
        .args(["stats", "show", "--net", "tcp1"])
        .assert()
        .code(4);
    ws.cmd()
        .args(["stats", "show", "--net", "tcp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.0.0.1@tcp"));
}

// ── peer ────────────────────────────────────────────────────────────

#[test]
fn test_peer_add_show_del() {
    let ws = Workspace::new();
    ws.run(&["peer", "add", "--name", "agent", "--nid", "10.0.1.1@tcp"]);
    ws.cmd()
        .args(["peer", "add", "--name", "agent", "--nid", "10.0.1.2@tcp"])
        .assert()
        .code(6);

    let peers = ws.json(&["peer", "show"]);
    assert_eq!(peers[0]["name"], "agent");
    assert_eq!(peers[0]["nids"][0], "10.0.1.1@tcp");

    ws.run(&["peer", "del", "--name", "agent"]);
    ws.cmd()
        .args(["peer", "del", "--name", "agent"])
        .assert()
        .code(4);
}

#[test]
fn test_peer_nid_cannot_belong_to_two_peers() {
    let ws = Workspace::new();
    ws.run(&["peer", "add", "--name", "agent", "--nid", "10.0.1.1@tcp"]);
    ws.cmd()
        .args(["peer", "add", "--name", "router", "--nid", "10.0.1.1@tcp"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("more than once"));
}
