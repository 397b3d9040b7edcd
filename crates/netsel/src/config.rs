//! CLI configuration: thin wrapper around `netsel_config`.
//!
//! Resolves the config path from `GlobalOpts`, builds the node a command
//! runs against, and writes mutations back.

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use netsel_core::Node;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netsel_config::{Config, PeerEntry, build_fabric, build_node, config_path};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in use: `--config` / `NETSEL_CONFIG`, else the platform path.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Output format: flag / env, then `[defaults] output`, then table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        OutputFormat::from_str(&cfg.defaults.output, true).unwrap_or(OutputFormat::Table)
    })
}

pub fn color_mode(global: &GlobalOpts, cfg: &Config) -> ColorMode {
    global.color.unwrap_or_else(|| {
        ColorMode::from_str(&cfg.defaults.color, true).unwrap_or(ColorMode::Auto)
    })
}

/// A loaded config plus the node configured from it.
pub struct Session {
    pub path: PathBuf,
    pub config: Config,
    pub node: Arc<Node>,
    pub output: OutputFormat,
    pub color: ColorMode,
    pub quiet: bool,
    pub yes: bool,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let path = resolve_path(global);
        let config = netsel_config::load_config(&path)?;
        let node = build_node(&config)?;
        tracing::debug!(
            path = %path.display(),
            nids = node.list_nids().len(),
            rules = node.rules().len(),
            "session opened"
        );
        Ok(Self {
            output: output_format(global, &config),
            color: color_mode(global, &config),
            quiet: global.quiet,
            yes: global.yes,
            path,
            config,
            node,
        })
    }

    /// Record node state in the config and write it back.
    pub fn persist(&mut self) -> Result<(), CliError> {
        self.config.sync_from(&self.node);
        netsel_config::save_config(&self.config, &self.path)?;
        Ok(())
    }

    /// Write the config as-is (for sections the node does not own).
    pub fn save(&self) -> Result<(), CliError> {
        netsel_config::save_config(&self.config, &self.path)?;
        Ok(())
    }

    /// Informational message on stderr, unless `--quiet`.
    pub fn note(&self, message: &str) {
        if !self.quiet {
            eprintln!("{message}");
        }
    }
}
