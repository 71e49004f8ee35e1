use dotenvy::dotenv;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

use crate::types::chain::ChainType;
use crate::utils::rpc_client::DEFAULT_REQUEST_TIMEOUT_MS;

/// Default balance refresh interval in milliseconds
const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

/// Default capacity of the monitor event channel
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Default HTTP bind address
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Balance monitoring configuration
#[derive(Debug, Clone)]
pub(crate) struct MonitorConfig {
    /// Balance refresh interval in milliseconds
    refresh_interval_ms: u64,

    /// Per-request wait ceiling in milliseconds
    request_timeout_ms: u64,

    /// Capacity of the event broadcast channel
    event_capacity: usize,

    /// Preferred provider endpoint per chain, applied at startup
    preferred_sources: HashMap<ChainType, String>,

    /// HTTP bind address
    bind_addr: SocketAddr,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            preferred_sources: HashMap::new(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }
}

impl MonitorConfig {
    pub fn new() -> Self {
        dotenv().ok(); // Load `.env` file if present

        let refresh_interval_ms: u64 = std::env::var("BALANCE_REFRESH_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS);

        let request_timeout_ms: u64 = std::env::var("BALANCE_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let event_capacity: usize = std::env::var("BALANCE_EVENT_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|capacity| *capacity > 0)
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        let mut preferred_sources = HashMap::new();
        for (chain, var) in [
            (ChainType::Bitcoin, "BITCOIN_API_SOURCE"),
            (ChainType::Ethereum, "ETHEREUM_API_SOURCE"),
            (ChainType::Solana, "SOLANA_API_SOURCE"),
        ] {
            if let Ok(endpoint) = std::env::var(var) {
                preferred_sources.insert(chain, endpoint);
            }
        }

        let bind_addr: SocketAddr = std::env::var("BALANCE_MONITOR_ADDR")
            .ok()
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 3000)));

        info!(
            refresh_interval_ms,
            request_timeout_ms,
            ?preferred_sources,
            %bind_addr,
            "Loaded balance monitoring config:"
        );

        MonitorConfig {
            refresh_interval_ms,
            request_timeout_ms,
            event_capacity,
            preferred_sources,
            bind_addr,
        }
    }

    /// Getter for `refresh_interval_ms`
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Getter for `request_timeout_ms`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Getter for `event_capacity`
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Getter for `preferred_sources`
    pub fn preferred_sources(&self) -> &HashMap<ChainType, String> {
        &self.preferred_sources
    }

    /// Getter for `bind_addr`
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    pub fn set_refresh_interval_ms(&mut self, refresh_interval_ms: u64) {
        self.refresh_interval_ms = refresh_interval_ms;
    }

    pub fn set_bind_addr(&mut self, bind_addr: SocketAddr) {
        self.bind_addr = bind_addr;
    }

    pub fn set_preferred_source(&mut self, chain: ChainType, api_endpoint: String) {
        self.preferred_sources.insert(chain, api_endpoint);
    }
}
