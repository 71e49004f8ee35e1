use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use crate::balances::handler::create_handler;
use crate::balances::traits::BalanceHandler;
use crate::types::chain::ChainType;

/// Routing table from chain to the handler that fetches its balances
#[derive(Debug, Default)]
pub(crate) struct BalanceManager {
    handlers: HashMap<ChainType, Box<dyn BalanceHandler>>,
}

impl BalanceManager {
    /// Create a [`BalanceManager`] with one handler per supported chain
    pub(crate) fn new(request_timeout: Duration) -> Self {
        let mut manager = Self::default();
        for chain in ChainType::SUPPORTED {
            if let Some(handler) = create_handler(chain, request_timeout) {
                manager.register_handler(chain, handler);
            }
        }
        manager
    }

    /// Install or replace the handler for `chain`
    pub(crate) fn register_handler(&mut self, chain: ChainType, handler: Box<dyn BalanceHandler>) {
        let replaced = self.handlers.insert(chain, handler).is_some();
        info!(%chain, replaced, "Registered balance handler");
    }

    pub(crate) fn handler(&self, chain: ChainType) -> Option<&dyn BalanceHandler> {
        self.handlers.get(&chain).map(|handler| handler.as_ref())
    }

    /// Forward a preferred-source request to the handler for `chain`
    ///
    /// Chains without a handler are ignored; [`BalanceManager::supported_chains`]
    /// tells callers which chains can be configured.
    pub(crate) fn set_preferred_api_source(&self, chain: ChainType, api_endpoint: &str) {
        match self.handler(chain) {
            Some(handler) => handler.set_preferred_api_source(api_endpoint),
            None => debug!(%chain, api_endpoint, "No handler for chain, ignoring API source"),
        }
    }

    pub(crate) fn current_api_source(&self, chain: ChainType) -> Option<&str> {
        self.handler(chain)?.current_api_source()
    }

    /// Chains that currently have a handler, in a stable order
    pub(crate) fn supported_chains(&self) -> Vec<ChainType> {
        let mut chains: Vec<ChainType> = self.handlers.keys().copied().collect();
        chains.sort_by_key(|chain| chain.as_str());
        chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balances::providers::ethereum::{CLOUDFLARE_ETHEREUM_RPC, PUBLICNODE_ETHEREUM_RPC};
    use crate::balances::providers::solana::SOLANA_MAINNET_RPC;

    fn manager() -> BalanceManager {
        BalanceManager::new(Duration::from_millis(5000))
    }

    #[test]
    fn test_supported_chains_are_registered() {
        let manager = manager();

        for chain in ChainType::SUPPORTED {
            assert!(manager.handler(chain).is_some(), "missing handler for {chain}");
        }
        assert_eq!(
            manager.supported_chains(),
            [ChainType::Bitcoin, ChainType::Ethereum, ChainType::Solana]
        );
    }

    #[test]
    fn test_unsupported_chain_is_not_found() {
        let manager = manager();

        assert!(manager.handler(ChainType::Bnbchain).is_none());
        assert!(manager.handler(ChainType::Unknown).is_none());
        assert!(manager.current_api_source(ChainType::Bnbchain).is_none());
    }

    #[test]
    fn test_preferred_source_routing() {
        let manager = manager();

        manager.set_preferred_api_source(ChainType::Ethereum, CLOUDFLARE_ETHEREUM_RPC);
        assert_eq!(
            manager.current_api_source(ChainType::Ethereum),
            Some(CLOUDFLARE_ETHEREUM_RPC)
        );

        // other chains are untouched
        assert_eq!(
            manager.current_api_source(ChainType::Solana),
            Some(SOLANA_MAINNET_RPC)
        );

        // endpoint belonging to another chain is not found
        manager.set_preferred_api_source(ChainType::Ethereum, SOLANA_MAINNET_RPC);
        assert_eq!(
            manager.current_api_source(ChainType::Ethereum),
            Some(CLOUDFLARE_ETHEREUM_RPC)
        );

        // silently ignored
        manager.set_preferred_api_source(ChainType::Bnbchain, PUBLICNODE_ETHEREUM_RPC);
    }

    #[test]
    fn test_register_replaces_handler() {
        let mut manager = BalanceManager::default();
        assert!(manager.supported_chains().is_empty());

        let timeout = Duration::from_millis(5000);
        manager.register_handler(
            ChainType::Bnbchain,
            create_handler(ChainType::Ethereum, timeout).unwrap(),
        );
        manager.register_handler(
            ChainType::Bnbchain,
            create_handler(ChainType::Solana, timeout).unwrap(),
        );

        assert_eq!(manager.supported_chains(), [ChainType::Bnbchain]);
        assert_eq!(
            manager.current_api_source(ChainType::Bnbchain),
            Some(SOLANA_MAINNET_RPC)
        );
    }
}
