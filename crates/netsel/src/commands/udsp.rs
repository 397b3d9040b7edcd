//! UDSP command handlers.

use tabled::Tabled;

use netsel_core::legacy::{self, LegacyUdsp};
use netsel_core::{Rule, RuleAction};

use crate::cli::{UdspArgs, UdspCommand};
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct UdspRow {
    #[tabled(rename = "Idx")]
    idx: usize,
    #[tabled(rename = "Src")]
    src: String,
    #[tabled(rename = "Dst")]
    dst: String,
    #[tabled(rename = "Action")]
    action: String,
}

impl From<&LegacyUdsp> for UdspRow {
    fn from(u: &LegacyUdsp) -> Self {
        let action = match u.action.priority {
            Some(priority) => format!("priority {priority}"),
            None => "exclude".into(),
        };
        Self {
            idx: u.idx,
            src: u.src.clone(),
            dst: u.dst.clone(),
            action,
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(session: &mut Session, args: UdspArgs) -> Result<(), CliError> {
    match args.command {
        UdspCommand::Add {
            src,
            dst,
            priority,
            idx,
            exclude,
        } => {
            let mut rule = Rule::parse(&src, dst.as_deref())?;
            if exclude {
                rule.action = RuleAction::Exclude;
            }
            if let Some(priority) = priority {
                rule = rule.with_priority(priority);
            }
            let id = match idx {
                Some(idx) => session.node.insert_rule(idx, rule)?,
                None => session.node.add_rule(rule)?,
            };
            session.persist()?;
            session.note(&format!("Policy {id} added"));
            Ok(())
        }

        UdspCommand::Del { idx: Some(idx), .. } => {
            let removed = session.node.remove_rule(idx)?;
            session.persist()?;
            session.note(&format!("Policy {idx} removed ({})", removed.rule));
            Ok(())
        }

        UdspCommand::Del { idx: None, .. } => {
            let count = session.node.rules().len();
            if count == 0 {
                session.note("No policies installed");
                return Ok(());
            }
            if !util::confirm(
                &format!("Delete all {count} policies?"),
                session.yes,
                "udsp del --all",
            )? {
                return Ok(());
            }
            session.node.clear_rules();
            session.persist()?;
            session.note(&format!("{count} policies removed"));
            Ok(())
        }

        UdspCommand::Show { idx } => {
            let mut shown = legacy::udsp_show(&session.node.rules().list());
            if let Some(idx) = idx {
                shown.retain(|u| u.idx == idx);
                if shown.is_empty() {
                    return Err(CliError::NotFound {
                        resource_type: "policy".into(),
                        identifier: idx.to_string(),
                        list_command: "udsp show".into(),
                    });
                }
            }
            let out = output::render_list(
                session.output,
                &shown,
                |u| UdspRow::from(u),
                |u| u.idx.to_string(),
            );
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}
