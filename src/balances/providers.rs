pub(crate) mod bitcoin;
pub(crate) mod ethereum;
pub(crate) mod solana;

use std::time::Duration;

use crate::balances::traits::BalanceProvider;
use crate::types::chain::ChainType;

use self::bitcoin::{EsploraProvider, BLOCKSTREAM_API, MEMPOOL_SPACE_API};
use self::ethereum::{EthereumRpcProvider, CLOUDFLARE_ETHEREUM_RPC, PUBLICNODE_ETHEREUM_RPC};
use self::solana::{SolanaRpcProvider, PUBLICNODE_SOLANA_RPC, SOLANA_MAINNET_RPC};

/// Builds the providers for `chain` in priority order, primary source first
///
/// Returns an empty list for chains without a provider implementation.
pub(crate) fn default_providers(chain: ChainType, timeout: Duration) -> Vec<Box<dyn BalanceProvider>> {
    match chain {
        ChainType::Bitcoin => vec![
            Box::new(EsploraProvider::new(MEMPOOL_SPACE_API, timeout).with_label(
                "mempool.space",
                "Open-source explorer with mempool visualization",
            )),
            Box::new(
                EsploraProvider::new(BLOCKSTREAM_API, timeout)
                    .with_label("Blockstream.info", "Bitcoin explorer by Blockstream"),
            ),
        ],
        ChainType::Ethereum => vec![
            Box::new(
                EthereumRpcProvider::new(PUBLICNODE_ETHEREUM_RPC, timeout)
                    .with_label("PublicNode", "Free public Ethereum mainnet RPC"),
            ),
            Box::new(
                EthereumRpcProvider::new(CLOUDFLARE_ETHEREUM_RPC, timeout)
                    .with_label("Cloudflare", "Ethereum gateway operated by Cloudflare"),
            ),
        ],
        ChainType::Solana => vec![
            Box::new(
                SolanaRpcProvider::new(SOLANA_MAINNET_RPC, timeout)
                    .with_label("Solana Mainnet", "Public mainnet-beta RPC by Solana Labs"),
            ),
            Box::new(
                SolanaRpcProvider::new(PUBLICNODE_SOLANA_RPC, timeout)
                    .with_label("PublicNode", "Free public Solana mainnet RPC"),
            ),
        ],
        ChainType::Bnbchain | ChainType::Unknown => Vec::new(),
    }
}
