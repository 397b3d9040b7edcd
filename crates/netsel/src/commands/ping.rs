//! Ping command handler.
//!
//! Sends GETs through an in-memory fabric built from the configured
//! peers, then reports which NI carried each one and how the local
//! counters moved.

use std::collections::BTreeMap;

use serde::Serialize;
use tabled::Tabled;

use netsel_core::{NetId, NiCounters, Nid, SendReport};

use crate::cli::{OutputFormat, PingArgs};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Debug, Serialize)]
struct PingSummary {
    destination: Nid,
    replies: Vec<SendReport>,
    /// Local counter change per network.
    delta: BTreeMap<NetId, NiCounters>,
}

#[derive(Tabled)]
struct DeltaRow {
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Send")]
    send: String,
    #[tabled(rename = "Recv")]
    recv: String,
    #[tabled(rename = "Drop")]
    drop: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl DeltaRow {
    fn new(net: NetId, c: &NiCounters, color: bool) -> Self {
        Self {
            net: net.to_string(),
            send: output::paint_delta(c.send_count, color),
            recv: output::paint_delta(c.recv_count, color),
            drop: output::paint_delta(c.drop_count, color),
            error: output::paint_delta(c.error_count, color),
        }
    }
}

fn detail(summary: &PingSummary, color: bool) -> String {
    let mut lines: Vec<String> = summary
        .replies
        .iter()
        .map(|r| {
            format!(
                "{} from {} via {} ({}), attempts: {}",
                r.delivery, r.route.remote, r.route.local, r.route.interface, r.attempts
            )
        })
        .collect();
    let rows: Vec<DeltaRow> = summary
        .delta
        .iter()
        .map(|(net, c)| DeltaRow::new(*net, c, color))
        .collect();
    lines.push(output::render_table(&rows));
    lines.join("\n")
}

pub fn handle(session: &Session, args: &PingArgs) -> Result<(), CliError> {
    let nid = util::parse_nid(&args.nid)?;
    let fabric = util::fabric_for(session, nid)?;

    let before = session.node.stats();
    let mut replies = Vec::new();
    for _ in 0..args.count {
        replies.push(session.node.ping(&fabric, nid)?);
    }
    let delta = session.node.stats().delta(&before);
    tracing::info!(%nid, count = args.count, "ping complete");

    let summary = PingSummary {
        destination: nid,
        replies,
        delta: delta.networks(),
    };
    let color = output::should_color(session.color);
    let out = match session.output {
        OutputFormat::Plain => summary
            .replies
            .iter()
            .map(|r| r.route.local.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        format => output::render_single(
            format,
            &summary,
            |s| detail(s, color),
            |s| s.destination.to_string(),
        ),
    };
    output::print_output(&out, session.quiet);
    Ok(())
}
