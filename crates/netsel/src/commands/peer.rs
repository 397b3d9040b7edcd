//! Peer command handlers.
//!
//! Peers live in the config only; `route` and `ping` simulate them.

use tabled::Tabled;

use crate::cli::{PeerArgs, PeerCommand};
use crate::config::{PeerEntry, Session};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PeerRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "NIDs")]
    nids: String,
}

impl From<&PeerEntry> for PeerRow {
    fn from(p: &PeerEntry) -> Self {
        Self {
            name: p.name.clone(),
            nids: p
                .nids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

pub fn handle(session: &mut Session, args: PeerArgs) -> Result<(), CliError> {
    match args.command {
        PeerCommand::Add { name, nid } => {
            if session.config.peers.iter().any(|p| p.name == name) {
                return Err(CliError::Conflict {
                    resource_type: "peer".into(),
                    identifier: name,
                    state: "known".into(),
                });
            }
            let nids = util::parse_nids(&nid)?;
            session.config.peers.push(PeerEntry {
                name: name.clone(),
                nids,
            });
            session.config.validate()?;
            session.save()?;
            session.note(&format!("Peer {name} added"));
            Ok(())
        }

        PeerCommand::Del { name } => {
            let before = session.config.peers.len();
            session.config.peers.retain(|p| p.name != name);
            if session.config.peers.len() == before {
                return Err(CliError::NotFound {
                    resource_type: "peer".into(),
                    identifier: name,
                    list_command: "peer show".into(),
                });
            }
            session.save()?;
            session.note(&format!("Peer {name} removed"));
            Ok(())
        }

        PeerCommand::Show => {
            let out = output::render_list(
                session.output,
                &session.config.peers,
                |p| PeerRow::from(p),
                |p| p.name.clone(),
            );
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}
