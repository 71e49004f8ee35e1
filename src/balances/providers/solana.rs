use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::balances::errors::ProviderError;
use crate::balances::traits::BalanceProvider;
use crate::types::chain::ChainType;
use crate::utils::rpc_client::{call, with_deadline};

/// Solana Labs mainnet-beta JSON-RPC endpoint
pub(crate) const SOLANA_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";

/// PublicNode Solana mainnet JSON-RPC endpoint
pub(crate) const PUBLICNODE_SOLANA_RPC: &str = "https://solana-rpc.publicnode.com";

/// `getBalance` result: `{ "context": {...}, "value": <lamports> }`
#[derive(Debug, Deserialize)]
struct BalanceValue {
    value: u64,
}

/// Solana JSON-RPC provider (`getBalance`)
#[derive(Debug)]
pub(crate) struct SolanaRpcProvider {
    api_endpoint: String,
    name: String,
    description: String,
    timeout: Duration,
}

impl SolanaRpcProvider {
    pub(crate) fn new(api_endpoint: impl Into<String>, timeout: Duration) -> Self {
        let api_endpoint = api_endpoint.into();
        Self {
            name: api_endpoint.clone(),
            api_endpoint,
            description: String::new(),
            timeout,
        }
    }

    /// Attach the display name and description shown when listing sources
    pub(crate) fn with_label(mut self, name: &str, description: &str) -> Self {
        self.name = name.to_string();
        self.description = description.to_string();
        self
    }
}

#[async_trait]
impl BalanceProvider for SolanaRpcProvider {
    fn chain(&self) -> ChainType {
        ChainType::Solana
    }

    fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn fetch_base_units(
        &self,
        client: &reqwest::Client,
        address: &str,
    ) -> Result<u128, ProviderError> {
        let balance: BalanceValue = with_deadline(
            self.timeout,
            call(client, &self.api_endpoint, "getBalance", [address]),
        )
        .await?;

        Ok(u128::from(balance.value))
    }
}
