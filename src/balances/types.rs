use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::chain::ChainType;

/// Outcome of one balance query, successful or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct BalanceResult {
    /// Queried address
    pub(crate) address: String,
    /// Chain the address was queried on
    pub(crate) chain: ChainType,
    /// Balance in the chain's native unit
    pub(crate) balance: f64,
    /// Whether `balance` is usable
    pub(crate) success: bool,
    /// Failure reason, empty on success
    pub(crate) error_message: String,
    /// Endpoint of the provider that produced or attempted this result
    pub(crate) data_source: String,
    /// When the result was produced
    pub(crate) observed_at: DateTime<Utc>,
}

impl BalanceResult {
    pub(crate) fn success(address: &str, chain: ChainType, balance: f64, data_source: &str) -> Self {
        Self {
            address: address.to_string(),
            chain,
            balance,
            success: true,
            error_message: String::new(),
            data_source: data_source.to_string(),
            observed_at: Utc::now(),
        }
    }

    pub(crate) fn failure(
        address: &str,
        chain: ChainType,
        error_message: impl Into<String>,
        data_source: &str,
    ) -> Self {
        Self {
            address: address.to_string(),
            chain,
            balance: 0.0,
            success: false,
            error_message: error_message.into(),
            data_source: data_source.to_string(),
            observed_at: Utc::now(),
        }
    }
}

/// The `(chain, address)` pair a monitor is tracking
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) struct TrackedAddress {
    pub(crate) chain: ChainType,
    pub(crate) address: String,
}

impl TrackedAddress {
    pub(crate) fn new(chain: ChainType, address: impl Into<String>) -> Self {
        Self {
            chain,
            address: address.into(),
        }
    }

    pub(crate) fn is_tracking(&self) -> bool {
        self.chain != ChainType::Unknown
    }
}

/// Descriptive entry for one selectable provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ProviderInfo {
    /// Identifier passed to `set_preferred_api_source`
    pub(crate) endpoint: String,
    pub(crate) name: String,
    pub(crate) description: String,
}

/// Event published by the monitor to its subscribers
#[derive(Debug, Clone)]
pub(crate) enum MonitorEvent {
    BalanceUpdated(BalanceResult),
    AddressChanged(TrackedAddress),
}
