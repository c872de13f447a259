//! Closed vocabulary of the order book: currencies, trading pairs, order
//! sides and origin chains, plus the account key.
//!
//! Every enum maps both ways to a canonical uppercase string. Parsing is
//! case-insensitive and unknown strings are rejected with the matching
//! [`EngineError`] variant.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::EngineError;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident rejects $err:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every supported value, in declaration order.
            pub const fn all() -> &'static [$name] {
                &[$($name::$variant),+]
            }

            /// Canonical uppercase form.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = EngineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(EngineError::$err(s.to_string())),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = EngineError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_str().to_string()
            }
        }
    };
}

vocabulary! {
    /// Currencies held in the ledger, denominated in their smallest unit.
    pub enum Currency rejects InvalidCurrency {
        Eth => "ETH",
        Eos => "EOS",
    }
}

vocabulary! {
    /// Trading pairs, written `BASE_QUOTE`.
    pub enum Symbol rejects InvalidPair {
        /// EOS priced in ETH.
        EosEth => "EOS_ETH",
    }
}

vocabulary! {
    /// Order side. A bid buys base with quote, an ask sells base for quote.
    pub enum Side rejects InvalidSide {
        Bid => "BID",
        Ask => "ASK",
    }
}

vocabulary! {
    /// Chain an account originates from.
    pub enum Chain rejects InvalidChain {
        Ethereum => "ETHEREUM",
        Eosio => "EOSIO",
    }
}

impl Currency {
    /// Chain the currency is native to.
    pub const fn native_chain(&self) -> Chain {
        match self {
            Currency::Eth => Chain::Ethereum,
            Currency::Eos => Chain::Eosio,
        }
    }
}

impl Symbol {
    pub const fn base(&self) -> Currency {
        match self {
            Symbol::EosEth => Currency::Eos,
        }
    }

    pub const fn quote(&self) -> Currency {
        match self {
            Symbol::EosEth => Currency::Eth,
        }
    }

    /// Look up the pair trading `base` against `quote`.
    pub fn from_currencies(base: Currency, quote: Currency) -> Result<Self, EngineError> {
        Symbol::all()
            .iter()
            .copied()
            .find(|s| s.base() == base && s.quote() == quote)
            .ok_or_else(|| EngineError::InvalidPair(format!("{base}_{quote}")))
    }

    pub fn involves(&self, currency: Currency) -> bool {
        self.base() == currency || self.quote() == currency
    }
}

impl Side {
    pub const fn opposite(&self) -> Side {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Currency an order on this side pays with.
    pub const fn spend_currency(&self, symbol: Symbol) -> Currency {
        match self {
            Side::Bid => symbol.quote(),
            Side::Ask => symbol.base(),
        }
    }

    /// Currency an order on this side receives.
    pub const fn receive_currency(&self, symbol: Symbol) -> Currency {
        self.opposite().spend_currency(symbol)
    }
}

/// Ledger account: an address on its origin chain.
///
/// Addresses compare case-insensitively, so they are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "AccountRepr")]
pub struct Account {
    address: String,
    chain: Chain,
}

#[derive(Deserialize)]
struct AccountRepr {
    address: String,
    chain: Chain,
}

impl From<AccountRepr> for Account {
    fn from(repr: AccountRepr) -> Self {
        Account::new(repr.address, repr.chain)
    }
}

impl Account {
    pub fn new(address: impl AsRef<str>, chain: Chain) -> Self {
        Self {
            address: address.as_ref().trim().to_lowercase(),
            chain,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn chain(&self) -> Chain {
        self.chain
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("eth".parse::<Currency>().unwrap(), Currency::Eth);
        assert_eq!(" Eos ".parse::<Currency>().unwrap(), Currency::Eos);
        assert_eq!("eos_eth".parse::<Symbol>().unwrap(), Symbol::EosEth);
        assert_eq!("bid".parse::<Side>().unwrap(), Side::Bid);
        assert_eq!("EOSIO".parse::<Chain>().unwrap(), Chain::Eosio);
    }

    #[test]
    fn test_unknown_strings_are_rejected() {
        assert_eq!(
            "BTC".parse::<Currency>(),
            Err(EngineError::InvalidCurrency("BTC".into()))
        );
        assert_eq!(
            "ETH_EOS".parse::<Symbol>(),
            Err(EngineError::InvalidPair("ETH_EOS".into()))
        );
        assert_eq!(
            "MARKET".parse::<Side>(),
            Err(EngineError::InvalidSide("MARKET".into()))
        );
        assert_eq!(
            "SOLANA".parse::<Chain>(),
            Err(EngineError::InvalidChain("SOLANA".into()))
        );
    }

    #[test]
    fn test_every_value_maps_back_to_itself() {
        for c in Currency::all() {
            assert_eq!(c.to_string().parse::<Currency>().unwrap(), *c);
        }
        for s in Symbol::all() {
            assert_eq!(s.to_string().parse::<Symbol>().unwrap(), *s);
        }
        for c in Chain::all() {
            assert_eq!(c.as_str().parse::<Chain>().unwrap(), *c);
        }
    }

    #[test]
    fn test_symbol_legs() {
        let s = Symbol::EosEth;
        assert_eq!(s.base(), Currency::Eos);
        assert_eq!(s.quote(), Currency::Eth);
        assert_eq!(Side::Bid.spend_currency(s), Currency::Eth);
        assert_eq!(Side::Ask.spend_currency(s), Currency::Eos);
        assert_eq!(Side::Bid.receive_currency(s), Currency::Eos);
        assert_eq!(
            Symbol::from_currencies(Currency::Eos, Currency::Eth).unwrap(),
            Symbol::EosEth
        );
        assert!(Symbol::from_currencies(Currency::Eth, Currency::Eos).is_err());
    }

    #[test]
    fn test_native_chains() {
        assert_eq!(Currency::Eth.native_chain(), Chain::Ethereum);
        assert_eq!(Currency::Eos.native_chain(), Chain::Eosio);
    }

    #[test]
    fn test_account_address_is_normalized() {
        let a = Account::new("0xABCdef", Chain::Ethereum);
        let b = Account::new("0xabcDEF ", Chain::Ethereum);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0xabcdef@ETHEREUM");
        assert_ne!(a, Account::new("0xabcdef", Chain::Eosio));
    }

    #[test]
    fn test_serde_uses_canonical_strings() {
        assert_eq!(serde_json::to_string(&Symbol::EosEth).unwrap(), "\"EOS_ETH\"");
        let side: Side = serde_json::from_str("\"ask\"").unwrap();
        assert_eq!(side, Side::Ask);
        assert!(serde_json::from_str::<Currency>("\"DOGE\"").is_err());

        let account: Account =
            serde_json::from_str(r#"{"address":"EOS1","chain":"eosio"}"#).unwrap();
        assert_eq!(account, Account::new("eos1", Chain::Eosio));
    }
}
