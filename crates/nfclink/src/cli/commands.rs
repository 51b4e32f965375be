//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Write command arguments.
#[derive(Debug, Args)]
pub struct WriteCommand {
    /// The URL to store on the tag
    pub url: String,
}

/// Destination command arguments.
#[derive(Debug, Args)]
pub struct DestinationCommand {
    /// A scanned value (URL or plain text)
    pub value: String,

    /// Redirect to use instead of the configured one
    #[arg(short, long)]
    pub redirect: Option<String>,
}

/// URL check command arguments.
#[derive(Debug, Args)]
pub struct CheckUrlCommand {
    /// The URL to validate
    pub url: String,
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
