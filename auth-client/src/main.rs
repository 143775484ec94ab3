// auth-client: one request/reply exchange with a UDP authentication token server.

mod channel;
mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use auth_core::AuthClient;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::channel::UdpChannel;
use crate::cli::Cli;
use crate::commands::{Failure, EXIT_INVALID_INPUT};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_INVALID_INPUT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!("{failure}");
            ExitCode::from(failure.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<String, Failure> {
    let mut cfg = config::load(cli.config.as_deref()).map_err(Failure::Config)?;
    if let Some(attempts) = cli.attempts {
        cfg.attempts = attempts;
    }
    if let Some(ms) = cli.timeout_ms {
        cfg.timeout_ms = ms;
    }

    // One exchange in flight at a time.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(Failure::Setup)?;
    let Cli {
        host,
        port,
        command,
        json,
        ..
    } = cli;
    rt.block_on(async move {
        let channel = UdpChannel::connect(&host, port)
            .await
            .map_err(Failure::Setup)?;
        let mut client = AuthClient::with_config(channel, cfg.exchange());
        commands::execute(&mut client, command, json).await
    })
}

/// Diagnostics go to stderr; stdout carries only the result line.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
