use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::balances::errors::ProviderError;
use crate::balances::traits::BalanceProvider;
use crate::types::chain::ChainType;
use crate::utils::rpc_client::{read_success_body, with_deadline};

/// mempool.space address API
pub(crate) const MEMPOOL_SPACE_API: &str = "https://mempool.space/api/address/";

/// Blockstream Esplora address API
pub(crate) const BLOCKSTREAM_API: &str = "https://blockstream.info/api/address/";

/// Funded and spent output totals, in satoshis
#[derive(Debug, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl TxoStats {
    fn net(&self) -> i128 {
        i128::from(self.funded_txo_sum) - i128::from(self.spent_txo_sum)
    }
}

/// Esplora `GET /address/:address` response, reduced to the fields used here
#[derive(Debug, Deserialize)]
struct AddressStats {
    chain_stats: TxoStats,
    mempool_stats: TxoStats,
}

impl AddressStats {
    /// Confirmed plus unconfirmed balance in satoshis
    fn balance_sats(&self) -> Result<u128, ProviderError> {
        let total = self.chain_stats.net() + self.mempool_stats.net();
        u128::try_from(total)
            .map_err(|_| ProviderError::Parse(format!("negative balance of {total} sats")))
    }
}

/// Esplora-style Bitcoin explorer provider (mempool.space, blockstream.info)
#[derive(Debug)]
pub(crate) struct EsploraProvider {
    api_endpoint: String,
    name: String,
    description: String,
    timeout: Duration,
}

impl EsploraProvider {
    /// `api_endpoint` is the address API prefix; the address is appended to it
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
impl BalanceProvider for EsploraProvider {
    fn chain(&self) -> ChainType {
        ChainType::Bitcoin
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
        let url = format!("{}{}", self.api_endpoint, address);

        let body = with_deadline(self.timeout, async {
            let response = client.get(&url).send().await?;
            read_success_body(response, &self.api_endpoint).await
        })
        .await?;

        let stats: AddressStats = serde_json::from_slice(&body)?;
        stats.balance_sats()
    }
}
