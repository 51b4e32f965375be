//! Command-line interface for nfclink.
//!
//! This module provides the CLI structure for the `nfclink` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    CheckUrlCommand, ConfigCommand, DestinationCommand, ScanCommand, StatusCommand, WriteCommand,
};

/// nfclink - Scan and write NFC tags
///
/// Reads the NDEF records on a tag, picks the URL or text it carries, and
/// prints where it should take you.
#[derive(Debug, Parser)]
#[command(name = "nfclink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Tag dump file to read from and write to (overrides the config)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub tag_file: Option<PathBuf>,

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
    /// Scan a tag and show where it leads
    Scan(ScanCommand),

    /// Write a URL to a tag
    Write(WriteCommand),

    /// Compute the destination for a scanned value
    Destination(DestinationCommand),

    /// Check whether a URL is valid
    CheckUrl(CheckUrlCommand),

    /// Show reader status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
