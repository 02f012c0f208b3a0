//! Command-line interface for infotic.
//!
//! This module provides the CLI structure for the `infotic` binary. Each
//! subcommand stands in for one screen of the field capture form.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CaptureCommand, ClearCommand, ConfigCommand, DashboardCommand, EvidenceKindArg, LoginCommand,
    OutputFormat, StatusCommand,
};

use crate::logging::Verbosity;

/// infotic - Field evidence capture
///
/// Log in, photograph a network node, and keep the evidence in a local
/// ledger that survives restarts.
#[derive(Debug, Parser)]
#[command(name = "infotic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in as an inspector
    Login(LoginCommand),

    /// Capture and submit a piece of evidence
    Capture(CaptureCommand),

    /// List stored evidence, newest first
    #[command(alias = "list")]
    Dashboard(DashboardCommand),

    /// Remove all stored evidence
    Clear(ClearCommand),

    /// Show session and storage status
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
