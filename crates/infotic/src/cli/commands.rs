//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::evidence::EvidenceKind;

/// Login command arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Inspector to log in as (defaults to the configured inspector)
    #[arg(short, long)]
    pub inspector: Option<String>,
}

/// Capture command arguments.
#[derive(Debug, Args)]
pub struct CaptureCommand {
    /// Identifier of the inspected node
    #[arg(short, long)]
    pub node_id: String,

    /// Kind of evidence
    #[arg(short = 't', long = "type", value_enum)]
    pub kind: EvidenceKindArg,

    /// Image file with the evidence photo
    #[arg(short, long, value_name = "FILE")]
    pub photo: Option<PathBuf>,

    /// Latitude of the capture, in decimal degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the capture, in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,
}

/// Dashboard command arguments.
#[derive(Debug, Args)]
pub struct DashboardCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Clear command arguments.
#[derive(Debug, Args)]
pub struct ClearCommand {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Evidence kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EvidenceKindArg {
    /// A new installation
    Installation,
    /// Routine maintenance
    Maintenance,
    /// A fault or damage
    Fault,
    /// A general inspection
    Inspection,
}

impl From<EvidenceKindArg> for EvidenceKind {
    fn from(arg: EvidenceKindArg) -> Self {
        match arg {
            EvidenceKindArg::Installation => Self::Installation,
            EvidenceKindArg::Maintenance => Self::Maintenance,
            EvidenceKindArg::Fault => Self::Fault,
            EvidenceKindArg::Inspection => Self::Inspection,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
