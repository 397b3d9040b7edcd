//! Command dispatch: bridges CLI args -> node operations -> output formatting.

pub mod config_cmd;
pub mod net;
pub mod peer;
pub mod ping;
pub mod route;
pub mod stats;
pub mod udsp;
pub mod util;

use crate::cli::{Cli, Command, CompletionsArgs, GlobalOpts};
use crate::config::Session;
use crate::error::CliError;

/// Run one command. Only node-bound commands load the node.
pub fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Completions(args) => {
            completions(&args);
            Ok(())
        }
        Command::Net(args) => net::handle(&mut open(global, "net")?, args),
        Command::Udsp(args) => udsp::handle(&mut open(global, "udsp")?, args),
        Command::Peer(args) => peer::handle(&mut open(global, "peer")?, args),
        Command::Route(args) => route::handle(&open(global, "route")?, &args),
        Command::Ping(args) => ping::handle(&open(global, "ping")?, &args),
        Command::Stats(args) => stats::handle(&open(global, "stats")?, &args),
    }
}

fn open(global: &GlobalOpts, command: &str) -> Result<Session, CliError> {
    let session = Session::open(global)?;
    tracing::debug!(command, "dispatching command");
    Ok(session)
}

fn completions(args: &CompletionsArgs) {
    let mut cmd = <Cli as clap::CommandFactory>::command();
    clap_complete::generate(args.shell, &mut cmd, "netsel", &mut std::io::stdout());
}
