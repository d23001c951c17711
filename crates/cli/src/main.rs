// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cyrus` — the edge orchestrator's command-line entry point.
//!
//! With no subcommand, starts the orchestrator: loads `$CYRUS_HOME/config.json`,
//! replays the persisted snapshot, and serves the webhook/OAuth endpoints
//! until interrupted. The remaining subcommands are one-shot maintenance
//! operations against the same config file.

mod commands;
mod config_file;
mod env_file;
mod exit_error;
mod logging;
mod prompt;
mod tracker_endpoint;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cyrus", version, about = "Bridges tracker webhooks to a local code-generation agent")]
struct Cli {
    /// Load environment variables from this file before resolving config.
    #[arg(long, value_name = "path", global = true)]
    env_file: Option<PathBuf>,

    /// Override `$CYRUS_HOME` (default `~/.cyrus`).
    #[arg(long, value_name = "dir", global = true)]
    cyrus_home: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe every configured repository's tracker token.
    CheckTokens,
    /// Re-run OAuth for a repository and replace its token everywhere it's shared.
    RefreshToken,
    /// Interactively add a new repository to the config.
    AddRepository,
    /// Billing linkage (out of scope).
    Billing,
    /// Associate this installation with a billing customer id (out of scope).
    SetCustomerId {
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(env_file) = &cli.env_file {
        if let Err(e) = env_file::load(env_file) {
            eprintln!("failed to load --env-file {}: {e}", env_file.display());
            std::process::exit(1);
        }
    }

    let cyrus_home = cli.cyrus_home.clone().unwrap_or_else(cyrus_daemon::config::default_cyrus_home);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(dispatch(cli.command, cyrus_home)) {
        match e.downcast_ref::<ExitError>() {
            Some(exit_err) => {
                eprintln!("{exit_err}");
                std::process::exit(exit_err.code);
            }
            None => {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn dispatch(command: Option<Command>, cyrus_home: PathBuf) -> anyhow::Result<()> {
    match command {
        None => commands::start::run(cyrus_home).await,
        Some(Command::CheckTokens) => commands::check_tokens::run(cyrus_home).await,
        Some(Command::RefreshToken) => commands::refresh_token::run(cyrus_home).await,
        Some(Command::AddRepository) => commands::add_repository::run(cyrus_home).await,
        Some(Command::Billing) => commands::billing::run(),
        Some(Command::SetCustomerId { id }) => commands::billing::set_customer_id(cyrus_home, id).await,
    }
}
