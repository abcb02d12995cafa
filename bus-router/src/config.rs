//! Process configuration from the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::ArrivalCacheConfig;
use crate::lta::LtaConfig;
use crate::planner::PlannerConfig;

/// An environment variable held a value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {name}: {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Network snapshot read by `serve` and written by `ingest`.
    pub data_path: PathBuf,
    pub lta: LtaConfig,
    pub arrival_cache: ArrivalCacheConfig,
    pub planner: PlannerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            data_path: PathBuf::from("data/network.json"),
            lta: LtaConfig::new(""),
            arrival_cache: ArrivalCacheConfig::default(),
            planner: PlannerConfig::default(),
        }
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError { name, value }),
    }
}

impl ServerConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// anything unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = parsed(&lookup, "BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(port) = parsed(&lookup, "PORT")? {
            config.port = port;
        }
        if let Some(path) = lookup("DATA_PATH").filter(|p| !p.is_empty()) {
            config.data_path = PathBuf::from(path);
        }

        let api_key = lookup("LTA_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            warn!("LTA_API_KEY not set; upstream calls will fail");
        }
        config.lta = LtaConfig::new(api_key);
        if let Some(url) = lookup("LTA_BASE_URL").filter(|u| !u.is_empty()) {
            config.lta = config.lta.with_base_url(url);
        }

        if let Some(capacity) = parsed(&lookup, "ARRIVAL_CACHE_CAPACITY")? {
            config.arrival_cache = config.arrival_cache.with_max_capacity(capacity);
        }
        if let Some(secs) = parsed::<u64>(&lookup, "ARRIVAL_TIMEOUT_SECS")? {
            config.planner = config
                .planner
                .with_arrival_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
