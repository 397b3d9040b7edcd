//! Route command handler: the attempt order a send would use.

use tabled::Tabled;

use netsel_core::Route;

use crate::cli::RouteArgs;
use crate::config::Session;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct RouteRow {
    #[tabled(rename = "#")]
    order: usize,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Local NI")]
    local: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Peer NI")]
    remote: String,
    #[tabled(rename = "Rank")]
    rank: String,
}

impl RouteRow {
    fn new(order: usize, route: &Route) -> Self {
        Self {
            order,
            net: route.net.to_string(),
            local: route.local.to_string(),
            interface: route.interface.clone(),
            remote: route.remote.to_string(),
            rank: route.rank.map_or_else(|| "-".into(), |r| r.to_string()),
        }
    }
}

pub fn handle(session: &Session, args: &RouteArgs) -> Result<(), CliError> {
    let nid = util::parse_nid(&args.nid)?;
    let _fabric = util::fabric_for(session, nid)?;
    let routes = session.node.routes(nid)?;

    let out = output::render_list_indexed(
        session.output,
        &routes,
        |i, r| RouteRow::new(i + 1, r),
        |r| format!("{} {}", r.local, r.remote),
    );
    output::print_output(&out, session.quiet);
    Ok(())
}
