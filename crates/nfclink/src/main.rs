//! `nfclink` - CLI for nfclink
//!
//! Scans tags through the configured reader, writes URLs to them, and
//! computes destinations for scanned values.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use nfclink::cli::{Cli, Command, ConfigCommand, DestinationCommand};
use nfclink::flow::{
    begin_scan, begin_write, finish_scan, finish_write, open_manual_url, user_message, WriteStatus,
};
use nfclink::reader::ReaderStatus;
use nfclink::{
    build_destination_url, init_logging, Config, NfcService, ReplayReader, ScanState, WriteState,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    run(cli).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        config: config_path,
        tag_file,
        command,
        ..
    } = cli;

    // Only commands that use the config load it, so a broken file can still be diagnosed
    match command {
        Command::Scan(scan_cmd) => {
            let config = load_config(config_path)?;
            let tag_file = tag_file.or_else(|| config.reader.tag_file.clone());
            handle_scan(&config, tag_file, scan_cmd.json).await
        }
        Command::Write(write_cmd) => {
            let config = load_config(config_path)?;
            let tag_file = tag_file.or_else(|| config.reader.tag_file.clone());
            handle_write(tag_file, &write_cmd.url).await
        }
        Command::Destination(destination_cmd) => {
            let config = load_config(config_path)?;
            handle_destination(&config, &destination_cmd);
            Ok(())
        }
        Command::CheckUrl(check_cmd) => handle_check_url(&check_cmd.url),
        Command::Status(status_cmd) => {
            let config = load_config(config_path)?;
            let tag_file = tag_file.or_else(|| config.reader.tag_file.clone());
            handle_status(&config, tag_file, status_cmd.json)
        }
        Command::Config(config_cmd) => handle_config(config_path, config_cmd),
    }
}

fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(config_path).context("loading configuration")
}

async fn handle_scan(config: &Config, tag_file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let mut service = NfcService::new(ReplayReader::new(tag_file));

    let state = begin_scan(&service, ScanState::default());
    if state.scanning {
        eprintln!("{}", state.status);
    }
    let state = finish_scan(&mut service, state).await;

    if let Some(error) = &state.error {
        bail!("{error} ({})", state.status);
    }

    let destination = state.destination(&config.default_redirect_url);

    if json {
        let output = serde_json::json!({
            "status": state.status,
            "result": state.result,
            "destination": destination,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", state.status);
    if let Some(result) = &state.result {
        println!("---------------");
        for (index, record) in result.raw_records.iter().enumerate() {
            match &record.media_type {
                Some(media_type) => {
                    println!("[{index}] {} ({media_type}): {}", record.record_type, record.data);
                }
                None => println!("[{index}] {}: {}", record.record_type, record.data),
            }
        }
        println!();
        println!("Value:        {}", result.best_value);
        println!("Type:         {}", result.best_value_type);
        println!("Read at:      {}", result.timestamp.to_rfc3339());
    }
    if state.has_destination(&config.default_redirect_url) {
        println!("Destination:  {destination}");
    }
    Ok(())
}

async fn handle_write(tag_file: Option<PathBuf>, url: &str) -> anyhow::Result<()> {
    let mut service = NfcService::new(ReplayReader::new(tag_file));

    let state = begin_write(&service, WriteState::default(), url);
    if state.status == WriteStatus::Waiting {
        eprintln!("{}", state.status);
    }
    let state = finish_write(&mut service, state, url).await;

    if let Some(error) = &state.error {
        bail!("{error} ({})", state.status);
    }

    println!("{}", state.status);
    if let Some(success) = &state.success {
        println!("{success}");
    }
    Ok(())
}

fn handle_destination(config: &Config, cmd: &DestinationCommand) {
    let redirect = cmd
        .redirect
        .as_deref()
        .unwrap_or(&config.default_redirect_url);
    println!("{}", build_destination_url(&cmd.value, redirect));
}

fn handle_check_url(url: &str) -> anyhow::Result<()> {
    match open_manual_url(url) {
        Ok(url) => {
            println!("{url}");
            Ok(())
        }
        Err(err) => bail!(user_message(&err)),
    }
}

fn handle_status(config: &Config, tag_file: Option<PathBuf>, json: bool) -> anyhow::Result<()> {
    let reader = ReplayReader::new(tag_file);
    let status = ReaderStatus::probe(&reader);

    if json {
        let output = serde_json::json!({
            "environment": config.env_label(),
            "reader": status.name,
            "supported": status.supported,
            "secure_context": status.secure_context,
            "tag_file": reader.tag_file(),
            "default_redirect_url": config.default_redirect_url,
            "message": status.message,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("nfclink status");
        println!("--------------");
        println!("Environment:    {}", config.env_label());
        println!("Reader:         {}", status.name);
        println!("Supported:      {}", status.supported);
        println!("Secure context: {}", status.secure_context);
        match reader.tag_file() {
            Some(path) => println!("Tag file:       {}", path.display()),
            None => println!("Tag file:       (none)"),
        }
        println!("Redirect:       {}", display_or_none(&config.default_redirect_url));
        println!();
        println!("{}", status.message);
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("  Environment:        {}", config.app_env_name);
                println!(
                    "  Default redirect:   {}",
                    display_or_none(&config.default_redirect_url)
                );
                println!();
                println!("[Reader]");
                match &config.reader.tag_file {
                    Some(path) => println!("  Tag file:           {}", path.display()),
                    None => println!("  Tag file:           (none)"),
                }
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn display_or_none(value: &str) -> &str {
    if value.is_empty() {
        "(none)"
    } else {
        value
    }
}
