//! Network command handlers.

use tabled::Tabled;

use netsel_core::{Interface, legacy};

use crate::cli::{NetArgs, NetCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct InterfaceRow {
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "NID")]
    nid: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "State")]
    state: String,
}

impl InterfaceRow {
    fn new(iface: &Interface, color: bool) -> Self {
        Self {
            net: iface.net.to_string(),
            nid: iface.nid.to_string(),
            interface: iface.name.clone(),
            state: output::paint_state(&iface.state.to_string(), color),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(session: &mut Session, args: NetArgs) -> Result<(), CliError> {
    match args.command {
        NetCommand::Add { net, interfaces } => {
            let net = util::parse_net(&net)?;
            let specs = session.config.claim_interfaces(&interfaces)?;
            let network = session.node.configure_net(net, &specs)?;
            session.persist()?;
            session.note(&format!(
                "Network {net} configured on {} interface(s)",
                network.interfaces.len()
            ));
            Ok(())
        }

        NetCommand::Del { net } => {
            let net = util::parse_net(&net)?;
            session.node.unconfigure_net(net)?;
            session.persist()?;
            session.note(&format!("Network {net} removed"));
            Ok(())
        }

        NetCommand::Show { detail, net } => {
            let networks = util::select_networks(session, net.as_deref())?;

            let out = if detail {
                let stats = legacy::net_stats(&networks, &session.node.stats());
                output::render_single(
                    session.output,
                    &stats,
                    output::render_yaml,
                    |s| {
                        s.iter()
                            .flat_map(|n| n.local_nis.iter().map(|ni| ni.nid.clone()))
                            .collect::<Vec<_>>()
                            .join("\n")
                    },
                )
            } else {
                let color = output::should_color(session.color);
                let interfaces: Vec<Interface> = networks
                    .iter()
                    .flat_map(|n| n.interfaces.iter().cloned())
                    .collect();
                output::render_list(
                    session.output,
                    &interfaces,
                    |i| InterfaceRow::new(i, color),
                    |i| i.nid.to_string(),
                )
            };
            output::print_output(&out, session.quiet);
            Ok(())
        }

        NetCommand::SetState { interface, state } => {
            let state = util::interface_state(state);
            session.node.set_interface_state(&interface, state)?;
            session.persist()?;
            session.note(&format!("Interface {interface} is now {state}"));
            Ok(())
        }
    }
}
