use super::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct WalletId(pub uuid::Uuid);

impl WalletId {
    pub fn new() -> Self {
        WalletId(uuid::Uuid::new_v4())
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for WalletId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(WalletId)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Chain {
    Ethereum,
    Bitcoin,
    Polygon,
    #[serde(rename = "Binance Smart Chain")]
    BinanceSmartChain,
    Avalanche,
    Arbitrum,
    Optimism,
}

impl Chain {
    pub const ALL: [Chain; 7] = [
        Chain::Ethereum,
        Chain::Bitcoin,
        Chain::Polygon,
        Chain::BinanceSmartChain,
        Chain::Avalanche,
        Chain::Arbitrum,
        Chain::Optimism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum",
            Chain::Bitcoin => "Bitcoin",
            Chain::Polygon => "Polygon",
            Chain::BinanceSmartChain => "Binance Smart Chain",
            Chain::Avalanche => "Avalanche",
            Chain::Arbitrum => "Arbitrum",
            Chain::Optimism => "Optimism",
        }
    }

    pub fn is_evm(&self) -> bool {
        !matches!(self, Chain::Bitcoin)
    }

    /// Checks the textual shape of an address for this chain. Checksums are not
    /// verified.
    pub fn accepts_address(&self, address: &str) -> bool {
        if self.is_evm() {
            return is_evm_address(address);
        }
        is_legacy_bitcoin_address(address) || is_bech32_bitcoin_address(address)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::ALL
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| format!("unsupported chain: {s}"))
    }
}

fn is_evm_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

fn is_legacy_bitcoin_address(address: &str) -> bool {
    (address.starts_with('1') || address.starts_with('3'))
        && (26..=35).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
}

fn is_bech32_bitcoin_address(address: &str) -> bool {
    match address.strip_prefix("bc1") {
        Some(rest) => {
            (39..=59).contains(&rest.len())
                && rest
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserId,
    pub tag: Option<String>,
    pub chain: Chain,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evm_addresses_need_prefix_and_forty_hex_digits() {
        let ok = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert!(Chain::Ethereum.accepts_address(ok));
        assert!(Chain::Polygon.accepts_address(ok));
        assert!(!Chain::Ethereum.accepts_address(&ok[2..]));
        assert!(!Chain::Ethereum.accepts_address("0x52908400098527886E0F7030069857D2E4169EZ7"));
        assert!(!Chain::Bitcoin.accepts_address(ok));
    }

    #[test]
    fn bitcoin_accepts_legacy_and_bech32() {
        assert!(Chain::Bitcoin.accepts_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2"));
        assert!(Chain::Bitcoin.accepts_address("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy"));
        assert!(Chain::Bitcoin.accepts_address("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq"));
        // '0' and 'O' are not part of base58
        assert!(!Chain::Bitcoin.accepts_address("1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVO0"));
        assert!(!Chain::Bitcoin.accepts_address("bc1QAR0SRRR7XFKVY5L643LYDNW9RE59GTZZWF5MDQ"));
    }

    #[test]
    fn chain_names_round_trip_through_serde() {
        let json = serde_json::to_string(&Chain::BinanceSmartChain).unwrap();
        assert_eq!(json, "\"Binance Smart Chain\"");
        let back: Chain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Chain::BinanceSmartChain);
        assert_eq!("Optimism".parse::<Chain>().unwrap(), Chain::Optimism);
        assert!("Dogecoin".parse::<Chain>().is_err());
    }
}
