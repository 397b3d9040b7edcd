//! Clap derive structures for the `netsel` CLI.
//!
//! Defines the command tree, global flags, and shared types. Values that
//! need domain parsing (networks, NIDs, selectors) stay strings here and
//! are parsed by the handlers, so this file builds with clap alone.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netsel -- multi-rail network selection and UDSP management
#[derive(Debug, Parser)]
#[command(
    name = "netsel",
    version,
    about = "Configure local networks and user-defined selection policies",
    long_about = "Configure the networks of a multi-rail node, install user-defined\n\
        selection policies (UDSPs), and inspect which local NI is used to\n\
        reach a peer. State lives in a TOML node description.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Node configuration file
    #[arg(long, short = 'f', env = "NETSEL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "NETSEL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure local networks
    #[command(alias = "n")]
    Net(NetArgs),

    /// Manage user-defined selection policies
    Udsp(UdspArgs),

    /// Manage known peers
    Peer(PeerArgs),

    /// Show the order in which local NIs would be tried for a peer
    #[command(alias = "r")]
    Route(RouteArgs),

    /// Ping a peer through the simulated fabric and report counter deltas
    Ping(PingArgs),

    /// Show traffic statistics
    Stats(StatsArgs),

    /// Inspect the CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NET
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NetArgs {
    #[command(subcommand)]
    pub command: NetCommand,
}

#[derive(Debug, Subcommand)]
pub enum NetCommand {
    /// Configure a network on one or more interfaces
    Add {
        /// Network name (tcp, tcp1, o2ib, ...)
        #[arg(long)]
        net: String,

        /// Interfaces: a declared name, or name=address to declare one
        #[arg(long = "if", required = true, value_delimiter = ',')]
        interfaces: Vec<String>,
    },

    /// Remove a network and release its interfaces
    #[command(alias = "rm")]
    Del {
        /// Network name
        #[arg(long)]
        net: String,
    },

    /// Show configured networks
    #[command(alias = "ls")]
    Show {
        /// Include statistics in the `net show -v` layout
        #[arg(long, short = 'd')]
        detail: bool,

        /// Only this network
        #[arg(long)]
        net: Option<String>,
    },

    /// Bring an interface up or down
    SetState {
        /// Interface name
        #[arg(long = "if")]
        interface: String,

        /// New state
        #[arg(value_enum)]
        state: StateArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Up,
    Down,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UDSP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct UdspArgs {
    #[command(subcommand)]
    pub command: UdspCommand,
}

#[derive(Debug, Subcommand)]
pub enum UdspCommand {
    /// Add a selection policy
    Add {
        /// Local network or NID selector (tcp, tcp[1-3], 10.0.0.[1-4]@tcp)
        #[arg(long)]
        src: String,

        /// Peer network or NID selector
        #[arg(long)]
        dst: Option<String>,

        /// Explicit rank; 0 is the highest. Defaults to the list position
        #[arg(long, conflicts_with = "exclude")]
        priority: Option<u32>,

        /// Insert at this list position instead of appending
        #[arg(long)]
        idx: Option<usize>,

        /// Never use matching routes
        #[arg(long)]
        exclude: bool,
    },

    /// Delete one policy or all of them
    #[command(alias = "rm", group(ArgGroup::new("target").required(true).args(["idx", "all"])))]
    Del {
        /// List position of the policy
        #[arg(long)]
        idx: Option<usize>,

        /// Delete every policy
        #[arg(long)]
        all: bool,
    },

    /// Show installed policies
    #[command(alias = "ls")]
    Show {
        /// Only the policy at this list position
        #[arg(long)]
        idx: Option<usize>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PEER
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PeerArgs {
    #[command(subcommand)]
    pub command: PeerCommand,
}

#[derive(Debug, Subcommand)]
pub enum PeerCommand {
    /// Record a peer and its NIDs
    Add {
        /// Peer name
        #[arg(long)]
        name: String,

        /// Peer NIDs, primary first
        #[arg(long, required = true, value_delimiter = ',')]
        nid: Vec<String>,
    },

    /// Forget a peer
    #[command(alias = "rm")]
    Del {
        /// Peer name
        #[arg(long)]
        name: String,
    },

    /// Show known peers
    #[command(alias = "ls")]
    Show,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ROUTE / PING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RouteArgs {
    /// Destination NID
    pub nid: String,
}

#[derive(Debug, Args)]
pub struct PingArgs {
    /// Destination NID
    pub nid: String,

    /// Number of pings
    #[arg(long, short = 'c', default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[command(subcommand)]
    pub command: StatsCommand,
}

#[derive(Debug, Subcommand)]
pub enum StatsCommand {
    /// Per-NI counters in the `net show -v` layout
    Show {
        /// Only this network
        #[arg(long)]
        net: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path in use
    Path,

    /// Display the resolved configuration
    Show,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
