//! Statistics command handler.

use tabled::Tabled;

use netsel_core::legacy::{self, LegacyNet, LegacyNi};

use crate::cli::{StatsArgs, StatsCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct NiRow {
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "NID")]
    nid: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Send")]
    send: u64,
    #[tabled(rename = "Recv")]
    recv: u64,
    #[tabled(rename = "Drop")]
    drop: u64,
    #[tabled(rename = "Error")]
    error: u64,
    #[tabled(rename = "Health")]
    health: u32,
}

impl NiRow {
    fn new(net: &LegacyNet, ni: &LegacyNi) -> Self {
        Self {
            net: net.net_type.clone(),
            nid: ni.nid.clone(),
            status: ni.status.clone(),
            send: ni.statistics.send_count,
            recv: ni.statistics.recv_count,
            drop: ni.statistics.drop_count,
            error: ni.health.error,
            health: ni.health.health_value,
        }
    }
}

pub fn handle(session: &Session, args: &StatsArgs) -> Result<(), CliError> {
    match &args.command {
        StatsCommand::Show { net } => {
            let networks = util::select_networks(session, net.as_deref())?;
            let stats = legacy::net_stats(&networks, &session.node.stats());

            let out = output::render_single(
                session.output,
                &stats,
                |s| {
                    let rows: Vec<NiRow> = s
                        .iter()
                        .flat_map(|net| net.local_nis.iter().map(move |ni| NiRow::new(net, ni)))
                        .collect();
                    output::render_table(&rows)
                },
                |s| {
                    s.iter()
                        .flat_map(|net| net.local_nis.iter().map(|ni| ni.nid.clone()))
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}
