use anyhow::{bail, Context};
use serde::Deserialize;
use std::path::Path;

use crate::cli::Cli;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_listen")]
    pub listen_addr: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub addr: String,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default)]
    pub server_name: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            addr: String::new(),
            tls: default_true(),
            server_name: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CodecConfig {
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default-value functions used by serde
// ---------------------------------------------------------------------------

fn default_listen() -> String {
    "0.0.0.0:6667".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_line_length() -> usize {
    irc_codec::DEFAULT_MAX_LINE_LENGTH
}

fn default_log_level() -> String {
    "info".to_string()
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Load configuration from a YAML file.
///
/// A missing file is not an error and yields `None`, so the relay can run
/// from command-line arguments alone. The caller reports it once logging is
/// up.
pub fn load(path: &Path) -> anyhow::Result<Option<Config>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;

    load_from_str(&contents)
        .map(Some)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

pub fn load_from_str(yaml: &str) -> anyhow::Result<Config> {
    let config: Config = serde_yml::from_str(yaml)?;
    Ok(config)
}

impl Config {
    /// Apply command-line overrides on top of the file settings.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(ref upstream) = cli.upstream {
            self.upstream.addr = upstream.clone();
        }
        if let Some(ref listen) = cli.listen {
            self.network.listen_addr = listen.clone();
        }
        if cli.plaintext_upstream {
            self.upstream.tls = false;
        }
    }

    /// Reject settings the relay cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.upstream.addr.trim().is_empty() {
            bail!("no upstream specified (pass UPSTREAM or set upstream.addr)");
        }
        if self.codec.max_line_length < 512 {
            bail!(
                "codec.max_line_length must be at least 512, got {}",
                self.codec.max_line_length
            );
        }
        Ok(())
    }
}
