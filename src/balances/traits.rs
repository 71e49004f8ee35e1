use async_trait::async_trait;
use std::fmt::Debug;
use tracing::{error, info, warn};

use crate::balances::errors::ProviderError;
use crate::balances::types::{BalanceResult, ProviderInfo};
use crate::types::chain::ChainType;

/// One remote data source for one chain family
#[async_trait]
pub(crate) trait BalanceProvider: Send + Sync + Debug {
    /// Chain family whose base units this provider reports
    fn chain(&self) -> ChainType;

    /// Fixed identifier of the endpoint, also used to select a preferred source
    fn api_endpoint(&self) -> &str;

    /// Human readable provider name
    fn name(&self) -> &str {
        self.api_endpoint()
    }

    fn description(&self) -> &str {
        ""
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            endpoint: self.api_endpoint().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }

    /// Query the endpoint and return the balance in base units
    async fn fetch_base_units(
        &self,
        client: &reqwest::Client,
        address: &str,
    ) -> Result<u128, ProviderError>;

    /// Query the endpoint and translate the outcome into a [`BalanceResult`]
    ///
    /// Never fails: every [`ProviderError`] becomes a result with `success == false`.
    async fn fetch_balance(
        &self,
        client: &reqwest::Client,
        address: &str,
        chain: ChainType,
    ) -> BalanceResult {
        let endpoint = self.api_endpoint();

        let err = match self.fetch_base_units(client, address).await {
            Ok(base_units) => match self.chain().to_native(base_units) {
                Some(balance) => {
                    info!(%chain, %address, balance, endpoint, "Fetched balance");
                    return BalanceResult::success(address, chain, balance, endpoint);
                }
                None => ProviderError::Parse(format!("no base unit divisor for {}", self.chain())),
            },
            Err(err) => err,
        };

        match &err {
            ProviderError::HostUnreachable(_) => {
                error!(%chain, %address, endpoint, error = %err, "Host not found");
            }
            ProviderError::Timeout => {
                error!(%chain, %address, endpoint, "Network timeout, request took too long");
            }
            ProviderError::Transport(_) | ProviderError::HttpStatus { .. } => {
                warn!(%chain, %address, endpoint, error = %err, "Network error");
            }
            ProviderError::Parse(_) | ProviderError::Rpc { .. } => {
                error!(%chain, %address, endpoint, error = %err, "Could not decode balance response");
            }
        }

        BalanceResult::failure(address, chain, err.to_string(), endpoint)
    }
}

/// The way to fetch a balance for one chain, hiding which provider is active
#[async_trait]
pub(crate) trait BalanceHandler: Send + Sync + Debug {
    /// Fetch through the active provider; `None` only when no provider is configured
    async fn fetch_balance(&self, client: &reqwest::Client, address: &str)
        -> Option<BalanceResult>;

    /// Make the provider whose endpoint equals `api_endpoint` active, if there is one
    fn set_preferred_api_source(&self, api_endpoint: &str);

    /// Endpoint of the active provider
    fn current_api_source(&self) -> Option<&str>;

    /// All providers, in priority order
    fn api_sources(&self) -> Vec<ProviderInfo>;
}
