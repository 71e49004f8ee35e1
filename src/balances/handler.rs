use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{info, warn};

use crate::balances::providers::default_providers;
use crate::balances::traits::{BalanceHandler, BalanceProvider};
use crate::balances::types::{BalanceResult, ProviderInfo};
use crate::types::chain::ChainType;

/// Provider set for one chain family
///
/// Providers are fixed at construction; the active one is tracked as an index into
/// that list so switching sources never invalidates anything.
#[derive(Debug)]
pub(crate) struct ChainHandler {
    chain: ChainType,
    providers: Vec<Box<dyn BalanceProvider>>,
    active: AtomicUsize,
}

impl ChainHandler {
    /// Create a new [`ChainHandler`]; the first provider starts out active
    pub(crate) fn new(chain: ChainType, providers: Vec<Box<dyn BalanceProvider>>) -> Self {
        Self {
            chain,
            providers,
            active: AtomicUsize::new(0),
        }
    }

    fn active_provider(&self) -> Option<&dyn BalanceProvider> {
        self.providers
            .get(self.active.load(Ordering::Acquire))
            .map(|provider| provider.as_ref())
    }
}

#[async_trait]
impl BalanceHandler for ChainHandler {
    async fn fetch_balance(
        &self,
        client: &reqwest::Client,
        address: &str,
    ) -> Option<BalanceResult> {
        let provider = self.active_provider()?;
        Some(provider.fetch_balance(client, address, self.chain).await)
    }

    fn set_preferred_api_source(&self, api_endpoint: &str) {
        match self
            .providers
            .iter()
            .position(|provider| provider.api_endpoint() == api_endpoint)
        {
            Some(index) => {
                self.active.store(index, Ordering::Release);
                info!(chain = %self.chain, api_endpoint, "API source switched");
            }
            None => {
                warn!(
                    chain = %self.chain,
                    api_endpoint,
                    "API source not found, keeping current provider"
                );
            }
        }
    }

    fn current_api_source(&self) -> Option<&str> {
        self.active_provider().map(|provider| provider.api_endpoint())
    }

    fn api_sources(&self) -> Vec<ProviderInfo> {
        self.providers.iter().map(|provider| provider.info()).collect()
    }
}

/// Builds the handler for `chain` with its default providers, or `None` if the chain
/// has no provider implementation
pub(crate) fn create_handler(chain: ChainType, timeout: Duration) -> Option<Box<dyn BalanceHandler>> {
    let providers = default_providers(chain, timeout);
    if providers.is_empty() {
        return None;
    }

    Some(Box::new(ChainHandler::new(chain, providers)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::errors::ProviderError;
    use crate::balances::providers::bitcoin::{BLOCKSTREAM_API, MEMPOOL_SPACE_API};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Provider returning a fixed amount and counting its calls
    #[derive(Debug)]
    struct FixedProvider {
        endpoint: &'static str,
        sats: u128,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl BalanceProvider for FixedProvider {
        fn chain(&self) -> ChainType {
            ChainType::Bitcoin
        }

        fn api_endpoint(&self) -> &str {
            self.endpoint
        }

        async fn fetch_base_units(
            &self,
            _client: &reqwest::Client,
            _address: &str,
        ) -> Result<u128, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.sats)
        }
    }

    fn two_provider_handler() -> (ChainHandler, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let secondary_calls = Arc::new(AtomicUsize::new(0));
        let handler = ChainHandler::new(
            ChainType::Bitcoin,
            vec![
                Box::new(FixedProvider {
                    endpoint: "primary",
                    sats: 100_000_000,
                    calls: Arc::clone(&primary_calls),
                }),
                Box::new(FixedProvider {
                    endpoint: "secondary",
                    sats: 50_000_000,
                    calls: Arc::clone(&secondary_calls),
                }),
            ],
        );
        (handler, primary_calls, secondary_calls)
    }

    #[tokio::test]
    async fn test_first_provider_is_active_by_default() {
        let (handler, primary_calls, secondary_calls) = two_provider_handler();
        let client = reqwest::Client::new();

        assert_eq!(handler.current_api_source(), Some("primary"));
        let result = handler.fetch_balance(&client, "addr").await.unwrap();

        assert_eq!(result.balance, 1.0);
        assert_eq!(result.data_source, "primary");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_switching_to_known_source() {
        let (handler, primary_calls, secondary_calls) = two_provider_handler();
        let client = reqwest::Client::new();

        handler.set_preferred_api_source("secondary");
        assert_eq!(handler.current_api_source(), Some("secondary"));

        let result = handler.fetch_balance(&client, "addr").await.unwrap();
        assert_eq!(result.balance, 0.5);
        assert_eq!(result.data_source, "secondary");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 0);
        assert_eq!(secondary_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_source_keeps_current() {
        let (handler, _, _) = two_provider_handler();

        handler.set_preferred_api_source("secondary");
        handler.set_preferred_api_source("https://example.invalid/");

        assert_eq!(handler.current_api_source(), Some("secondary"));
        let endpoints: Vec<String> = handler
            .api_sources()
            .into_iter()
            .map(|info| info.endpoint)
            .collect();
        assert_eq!(endpoints, ["primary", "secondary"]);
    }

    #[tokio::test]
    async fn test_empty_handler_yields_none() {
        let handler = ChainHandler::new(ChainType::Bitcoin, Vec::new());
        let client = reqwest::Client::new();

        assert!(handler.fetch_balance(&client, "addr").await.is_none());
        assert!(handler.current_api_source().is_none());
    }

    #[test]
    fn test_factory() {
        let timeout = Duration::from_millis(5000);

        let bitcoin = create_handler(ChainType::Bitcoin, timeout).unwrap();
        assert_eq!(bitcoin.current_api_source(), Some(MEMPOOL_SPACE_API));
        let sources = bitcoin.api_sources();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].endpoint, MEMPOOL_SPACE_API);
        assert_eq!(sources[0].name, "mempool.space");
        assert_eq!(sources[1].endpoint, BLOCKSTREAM_API);
        assert_eq!(sources[1].name, "Blockstream.info");
        assert!(sources.iter().all(|info| !info.description.is_empty()));

        assert!(create_handler(ChainType::Bnbchain, timeout).is_none());
        assert!(create_handler(ChainType::Unknown, timeout).is_none());
    }
}
