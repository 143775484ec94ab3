//! Load config from file and environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use auth_core::exchange::{
    ExchangeConfig, DEFAULT_ATTEMPTS, DEFAULT_RECV_BUFFER_SIZE, DEFAULT_TIMEOUT,
};
use auth_core::wire::INDIVIDUAL_STATUS_LEN;
use serde::Deserialize;
use tracing::{debug, warn};

/// Client configuration. File: ~/.config/auth-client/config.toml or /etc/auth-client/config.toml.
/// Env overrides: AUTH_CLIENT_ATTEMPTS, AUTH_CLIENT_TIMEOUT_MS, AUTH_CLIENT_RECV_BUFFER.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Sends per request before giving up (default 5).
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Per-attempt reply timeout in milliseconds (default 6000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Receive buffer ceiling in bytes (default 4096).
    #[serde(default = "default_recv_buffer")]
    pub recv_buffer: usize,
}

fn default_attempts() -> u32 {
    DEFAULT_ATTEMPTS
}
fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}
fn default_recv_buffer() -> usize {
    DEFAULT_RECV_BUFFER_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            timeout_ms: default_timeout_ms(),
            recv_buffer: default_recv_buffer(),
        }
    }
}

impl Config {
    pub fn exchange(&self) -> ExchangeConfig {
        ExchangeConfig {
            attempts: self.attempts,
            timeout: Duration::from_millis(self.timeout_ms),
            recv_buffer_size: self.recv_buffer,
        }
    }

    /// Reject values that would make a received reply unreadable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.recv_buffer < INDIVIDUAL_STATUS_LEN {
            bail!(
                "recv_buffer is {} bytes, at least {INDIVIDUAL_STATUS_LEN} needed",
                self.recv_buffer
            );
        }
        Ok(())
    }

    /// Override fields from environment-style variables; unparsable values are ignored.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = var("AUTH_CLIENT_ATTEMPTS") {
            match s.parse::<u32>() {
                Ok(v) => self.attempts = v,
                Err(_) => warn!(value = %s, "ignoring invalid AUTH_CLIENT_ATTEMPTS"),
            }
        }
        if let Some(s) = var("AUTH_CLIENT_TIMEOUT_MS") {
            match s.parse::<u64>() {
                Ok(v) => self.timeout_ms = v,
                Err(_) => warn!(value = %s, "ignoring invalid AUTH_CLIENT_TIMEOUT_MS"),
            }
        }
        if let Some(s) = var("AUTH_CLIENT_RECV_BUFFER") {
            match s.parse::<usize>() {
                Ok(v) => self.recv_buffer = v,
                Err(_) => warn!(value = %s, "ignoring invalid AUTH_CLIENT_RECV_BUFFER"),
            }
        }
    }
}

/// Load config: merge default, then config file, then env vars.
/// An explicit `path` must exist and parse; the default locations are best-effort.
pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut c = match path {
        Some(p) => read_file(p)?,
        None => load_default_file().unwrap_or_default(),
    };
    c.apply_env(|name| std::env::var(name).ok());
    c.validate()?;
    Ok(c)
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/auth-client/config.toml"));
    }
    out.push(PathBuf::from("/etc/auth-client/config.toml"));
    out
}

fn load_default_file() -> Option<Config> {
    let p = config_paths().into_iter().find(|p| p.exists())?;
    match read_file(&p) {
        Ok(c) => {
            debug!(path = %p.display(), "loaded config");
            Some(c)
        }
        Err(e) => {
            warn!("falling back to default config: {e:#}");
            None
        }
    }
}

fn read_file(path: &Path) -> anyhow::Result<Config> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    parse(&s).with_context(|| format!("parsing config file {}", path.display()))
}

pub fn parse(s: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str::<Config>(s)?)
}
