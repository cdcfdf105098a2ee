//! Configuration loading

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tltb_core::Subnet;
use tltb_discovery::probe::DEVICE_PORT;
use tltb_discovery::scanner::DEFAULT_CONCURRENCY;
use tltb_discovery::{ProbeConfig, ScannerConfig, DEVICE_HOSTNAME};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub probe: ProbeTimeouts,
    #[serde(default)]
    pub mdns: MdnsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Subnet to scan (auto-detected when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<Subnet>,
    /// Maximum number of hosts probed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Device web server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            subnet: None,
            concurrency: default_concurrency(),
            port: default_port(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_port() -> u16 {
    DEVICE_PORT
}

/// Per-endpoint request timeouts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeTimeouts {
    #[serde(default = "default_discover_timeout")]
    pub discover_timeout_ms: u64,
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout_ms: u64,
    #[serde(default = "default_root_timeout")]
    pub root_timeout_ms: u64,
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self {
            discover_timeout_ms: default_discover_timeout(),
            ping_timeout_ms: default_ping_timeout(),
            root_timeout_ms: default_root_timeout(),
        }
    }
}

fn default_discover_timeout() -> u64 {
    2000
}

fn default_ping_timeout() -> u64 {
    1000
}

fn default_root_timeout() -> u64 {
    2000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdnsConfig {
    /// Run the mDNS self-test before scanning
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Hostname to resolve
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

impl Default for MdnsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hostname: default_hostname(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_hostname() -> String {
    DEVICE_HOSTNAME.to_string()
}

impl Config {
    /// Convert to ScannerConfig
    pub fn to_scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            concurrency: self.scan.concurrency,
            probe: ProbeConfig {
                port: self.scan.port,
                discover_timeout_ms: self.probe.discover_timeout_ms,
                ping_timeout_ms: self.probe.ping_timeout_ms,
                root_timeout_ms: self.probe.root_timeout_ms,
            },
        }
    }
}

/// Load configuration from file, falling back to defaults if it is missing
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
