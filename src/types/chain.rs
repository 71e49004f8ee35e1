use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Satoshis per bitcoin
pub(crate) const SATS_PER_BTC: f64 = 1e8;

/// Weis per ether
pub(crate) const WEIS_PER_ETH: f64 = 1e18;

/// Lamports per sol
pub(crate) const LAMPORTS_PER_SOL: f64 = 1e9;

/// Blockchain family an address or provider belongs to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub(crate) enum ChainType {
    Bitcoin,
    Ethereum,
    Solana,
    Bnbchain,
    #[default]
    Unknown,
}

impl ChainType {
    /// Chains that get a handler when the manager is built
    pub(crate) const SUPPORTED: [ChainType; 3] =
        [ChainType::Bitcoin, ChainType::Ethereum, ChainType::Solana];

    /// Number of base units in one native coin, if known for this chain
    pub(crate) fn base_unit_divisor(&self) -> Option<f64> {
        match self {
            ChainType::Bitcoin => Some(SATS_PER_BTC),
            ChainType::Ethereum => Some(WEIS_PER_ETH),
            ChainType::Solana => Some(LAMPORTS_PER_SOL),
            ChainType::Bnbchain => Some(WEIS_PER_ETH),
            ChainType::Unknown => None,
        }
    }

    /// Converts an integer amount of base units into the native unit
    pub(crate) fn to_native(&self, base_units: u128) -> Option<f64> {
        self.base_unit_divisor()
            .map(|divisor| base_units as f64 / divisor)
    }

    /// Guesses the chain from the shape of `address`
    ///
    /// Only the format is inspected (prefix, length, alphabet); checksums are not
    /// verified. Returns [`ChainType::Unknown`] when nothing matches.
    pub(crate) fn detect(address: &str) -> ChainType {
        let len = address.len();

        if let Some(hex) = address.strip_prefix("0x") {
            if hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return ChainType::Ethereum;
            }
        }

        if (address.starts_with('1') || address.starts_with('3'))
            && (26..=35).contains(&len)
            && is_base58(address)
        {
            return ChainType::Bitcoin;
        }

        if let Some(rest) = address.strip_prefix("bc1") {
            if (25..=90).contains(&rest.len()) && rest.chars().all(|c| c.is_ascii_alphanumeric()) {
                return ChainType::Bitcoin;
            }
        }

        if (43..=44).contains(&len) && is_base58(address) {
            return ChainType::Solana;
        }

        ChainType::Unknown
    }

    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            ChainType::Bitcoin => "BITCOIN",
            ChainType::Ethereum => "ETHEREUM",
            ChainType::Solana => "SOLANA",
            ChainType::Bnbchain => "BNBCHAIN",
            ChainType::Unknown => "UNKNOWN",
        }
    }
}

fn is_base58(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a chain name is not recognised
#[derive(Debug, thiserror::Error)]
#[error("unrecognised chain: {0}")]
pub(crate) struct ParseChainError(String);

impl FromStr for ChainType {
    type Err = ParseChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(ChainType::Bitcoin),
            "ethereum" | "eth" => Ok(ChainType::Ethereum),
            "solana" | "sol" => Ok(ChainType::Solana),
            "bnbchain" | "bnb" | "bsc" => Ok(ChainType::Bnbchain),
            "unknown" => Ok(ChainType::Unknown),
            _ => Err(ParseChainError(s.to_string())),
        }
    }
}
