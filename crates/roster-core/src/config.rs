//! Configuration shared by the auditor, the musicians and roster-ctl.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $ROSTER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/roster/config.toml
//!   3. ~/.config/roster/config.toml

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::wire::{
    ANNOUNCE_INTERVAL_MS, MULTICAST_ADDR, MULTICAST_PORT, QUERY_PORT, ROSTER_TTL_MS,
    SWEEP_INTERVAL_MS,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub network: NetworkConfig,
    pub liveness: LivenessConfig,
    pub emitter: EmitterConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Multicast group musicians announce on.
    pub multicast_addr: Ipv4Addr,
    pub multicast_port: u16,
    /// Local interface address used to join / send on the group.
    /// 0.0.0.0 lets the OS pick.
    pub interface: Ipv4Addr,
    /// Multicast TTL for outgoing announcements. 1 = this link only.
    pub multicast_ttl: u32,
    /// Address the auditor serves roster snapshots on.
    pub query_host: IpAddr,
    pub query_port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Musicians not heard within this many milliseconds are dropped.
    pub ttl_ms: u64,
    /// Milliseconds between expiry sweeps.
    pub sweep_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Milliseconds between two announcements from one musician.
    pub announce_interval_ms: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            multicast_addr: MULTICAST_ADDR,
            multicast_port: MULTICAST_PORT,
            interface: Ipv4Addr::UNSPECIFIED,
            multicast_ttl: 1,
            query_host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            query_port: QUERY_PORT,
        }
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            ttl_ms: ROSTER_TTL_MS,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
        }
    }
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            announce_interval_ms: ANNOUNCE_INTERVAL_MS,
        }
    }
}

// ── Accessors ─────────────────────────────────────────────────────────────────

impl NetworkConfig {
    pub fn query_addr(&self) -> SocketAddr {
        SocketAddr::new(self.query_host, self.query_port)
    }
}

impl LivenessConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

impl EmitterConfig {
    pub fn announce_interval(&self) -> Duration {
        Duration::from_millis(self.announce_interval_ms.max(1))
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("roster")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("no instrument given")]
    MissingInstrument,
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl RosterConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            RosterConfig::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("ROSTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Parse a config file. Missing keys fall back to defaults.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Apply ROSTER_<SECTION>__<KEY> overrides. Values that do not parse are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let net = &mut self.network;
        set(&mut net.multicast_addr, lookup("ROSTER_NETWORK__MULTICAST_ADDR"));
        set(&mut net.multicast_port, lookup("ROSTER_NETWORK__MULTICAST_PORT"));
        set(&mut net.interface, lookup("ROSTER_NETWORK__INTERFACE"));
        set(&mut net.multicast_ttl, lookup("ROSTER_NETWORK__MULTICAST_TTL"));
        set(&mut net.query_host, lookup("ROSTER_NETWORK__QUERY_HOST"));
        set(&mut net.query_port, lookup("ROSTER_NETWORK__QUERY_PORT"));

        set(&mut self.liveness.ttl_ms, lookup("ROSTER_LIVENESS__TTL_MS"));
        set(
            &mut self.liveness.sweep_interval_ms,
            lookup("ROSTER_LIVENESS__SWEEP_INTERVAL_MS"),
        );

        set(
            &mut self.emitter.announce_interval_ms,
            lookup("ROSTER_EMITTER__ANNOUNCE_INTERVAL_MS"),
        );
    }
}

fn set<T: FromStr>(slot: &mut T, value: Option<String>) {
    if let Some(parsed) = value.and_then(|v| v.trim().parse().ok()) {
        *slot = parsed;
    }
}
