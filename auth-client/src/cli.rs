//! Command-line surface.

use std::path::PathBuf;

use auth_core::{Gas, Sas};
use clap::{Parser, Subcommand};

/// Basic UDP authentication token client.
#[derive(Parser, Debug)]
#[command(name = "auth-client", version, about, long_about = None)]
pub struct Cli {
    /// Authentication server host, as an IPv4/IPv6 address or as a hostname
    pub host: String,

    /// Authentication server port
    pub port: u16,

    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ~/.config/auth-client/config.toml, then /etc/auth-client/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Sends per request before giving up
    #[arg(long, global = true)]
    pub attempts: Option<u32>,

    /// Per-attempt reply timeout in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Print the whole decoded reply as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log each step to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Individual token request: prints id:nonce:token
    Itr {
        id: String,
        #[arg(allow_negative_numbers = true)]
        nonce: i32,
    },
    /// Individual token validation: prints the status code
    Itv {
        /// id:nonce:token
        sas: Sas,
    },
    /// Group token request: prints sas+...+sas+token
    Gtr {
        /// Declared group size
        n: i16,
        /// Group members in order, each id:nonce:token
        #[arg(required = true)]
        members: Vec<Sas>,
    },
    /// Group token validation: prints the status code
    Gtv {
        /// sas+...+sas+token
        gas: Gas,
    },
}
