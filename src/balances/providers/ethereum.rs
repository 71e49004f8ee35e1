use alloy_primitives::U256;
use async_trait::async_trait;
use std::time::Duration;

use crate::balances::errors::ProviderError;
use crate::balances::traits::BalanceProvider;
use crate::types::chain::ChainType;
use crate::utils::rpc_client::{call, with_deadline};

/// PublicNode Ethereum mainnet JSON-RPC endpoint
pub(crate) const PUBLICNODE_ETHEREUM_RPC: &str = "https://ethereum-rpc.publicnode.com";

/// Cloudflare Ethereum mainnet JSON-RPC endpoint
pub(crate) const CLOUDFLARE_ETHEREUM_RPC: &str = "https://cloudflare-eth.com";

/// Decodes a JSON-RPC quantity (`"0x..."`) into wei
fn parse_quantity(quantity: &str) -> Result<u128, ProviderError> {
    let digits = quantity.strip_prefix("0x").unwrap_or(quantity);
    if digits.is_empty() {
        return Err(ProviderError::Parse(format!("empty quantity {quantity:?}")));
    }

    let wei = U256::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::Parse(format!("invalid quantity {quantity:?}: {e}")))?;

    u128::try_from(wei)
        .map_err(|_| ProviderError::Parse(format!("quantity {quantity} out of range")))
}

/// Ethereum JSON-RPC provider (`eth_getBalance`)
#[derive(Debug)]
pub(crate) struct EthereumRpcProvider {
    api_endpoint: String,
    name: String,
    description: String,
    timeout: Duration,
}

impl EthereumRpcProvider {
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
impl BalanceProvider for EthereumRpcProvider {
    fn chain(&self) -> ChainType {
        ChainType::Ethereum
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
        let quantity: String = with_deadline(
            self.timeout,
            call(client, &self.api_endpoint, "eth_getBalance", (address, "latest")),
        )
        .await?;

        parse_quantity(&quantity)
    }
}
