//! Pool Model - Two-token liquidity pool simulation over bounded big integers
//!
//! This crate models a bonding-curve exchange with two reserve branches
//! (`TKN` and `BNT`), each pairing a reserve ledger with a pool-share ledger.
//! All arithmetic is exact unbounded integer arithmetic, checked against the
//! 256-bit ceiling of the target contract platform.
//!
//! Layering (leaf first): [`math`] → [`ledger`] → [`branch`] → [`pool`] →
//! [`factory`]. The [`exp`] module generates the fixed-point series used by
//! the on-chain exponential approximation.

#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

pub mod math;
pub mod ledger;
pub mod branch;
pub mod pool;
pub mod factory;
pub mod exp;
pub mod snapshot;

pub use branch::Branch;
pub use exp::{ExpParams, ExpSeries, HiTerm, LoTerm};
pub use factory::{new_pool, user_id, POOL_ID};
pub use ledger::Ledger;
pub use pool::{ArbitrageOutcome, Pool, SwapOutcome};
pub use snapshot::{BranchSnapshot, LedgerSnapshot, PoolSnapshot};

/// Unsigned amount type. Range is enforced by [`math`], not by the type.
pub type Uint = BigUint;

/// Parts-per-million scale (1,000,000 ppm = 100%)
pub const PPM: u32 = 1_000_000;

/// Largest value any balance, supply or intermediate product may take
pub fn max_uint() -> Uint {
    (Uint::from(1u8) << 256usize) - 1u8
}

/// Error types for pool operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Arithmetic result exceeds 2^256 - 1
    #[error("arithmetic overflow")]
    Overflow,
    /// Arithmetic result below zero
    #[error("arithmetic underflow")]
    Underflow,
    /// Division or ratio with a zero denominator
    #[error("division by zero")]
    DivisionByZero,
    /// Balance lookup for an account the ledger does not track
    #[error("unknown account `{account}` on ledger {ledger}")]
    UnknownAccount { ledger: String, account: String },
    /// Re-registration of an account still holding a balance
    #[error("account `{account}` already registered on ledger {ledger} with a non-zero balance")]
    AlreadyRegistered { ledger: String, account: String },
    /// Swap between a branch and itself
    #[error("cannot swap {0} for itself")]
    SameSymbol(Symbol),
    /// Swap fee outside 0..=PPM
    #[error("swap fee {0} ppm exceeds 1000000 ppm")]
    InvalidSwapFee(u32),
    /// Exponent input at or above the highest series bit
    #[error("exp input too high")]
    ExpValueTooHigh,
    /// Exp series parameters the generator cannot honour
    #[error("invalid exp parameters: {0}")]
    InvalidExpParams(String),
    /// Symbol string that names neither branch
    #[error("unknown symbol `{0}`")]
    UnknownSymbol(String),
}

pub type Result<T> = core::result::Result<T, PoolError>;

/// Reserve symbol. A pool holds exactly one branch per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Tkn,
    Bnt,
}

impl Symbol {
    pub const ALL: [Symbol; 2] = [Symbol::Tkn, Symbol::Bnt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Tkn => "TKN",
            Symbol::Bnt => "BNT",
        }
    }

    /// The other branch of the pair
    pub fn counterpart(&self) -> Symbol {
        match self {
            Symbol::Tkn => Symbol::Bnt,
            Symbol::Bnt => Symbol::Tkn,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbol {
    type Err = PoolError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TKN" => Ok(Symbol::Tkn),
            "BNT" => Ok(Symbol::Bnt),
            other => Err(PoolError::UnknownSymbol(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Liquidity amount: a literal quantity or the caller's whole balance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Amount {
    Exact(Uint),
    All,
}

impl Amount {
    /// Resolve against the balance `All` stands for
    pub fn resolve(&self, balance: &Uint) -> Uint {
        match self {
            Amount::Exact(value) => value.clone(),
            Amount::All => balance.clone(),
        }
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount::Exact(Uint::from(value))
    }
}

impl From<Uint> for Amount {
    fn from(value: Uint) -> Self {
        Amount::Exact(value)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

struct AmountVisitor;

impl<'de> Visitor<'de> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer, a decimal string or \"all\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> core::result::Result<Amount, E> {
        decimal::DecimalVisitor.visit_u64(v).map(Amount::Exact)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> core::result::Result<Amount, E> {
        decimal::DecimalVisitor.visit_i64(v).map(Amount::Exact)
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> core::result::Result<Amount, E> {
        decimal::DecimalVisitor.visit_u128(v).map(Amount::Exact)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> core::result::Result<Amount, E> {
        if v == "all" {
            return Ok(Amount::All);
        }
        decimal::DecimalVisitor.visit_str(v).map(Amount::Exact)
    }

    fn visit_map<A: de::MapAccess<'de>>(self, map: A) -> core::result::Result<Amount, A::Error> {
        decimal::DecimalVisitor.visit_map(map).map(Amount::Exact)
    }
}

/// Serde helpers writing [`Uint`] as decimal strings
pub mod decimal {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Uint;

    pub fn serialize<S: Serializer>(value: &Uint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    /// Accepts a JSON or TOML integer of any size, or a decimal string
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uint, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    pub(crate) struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = Uint;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Uint, E> {
            Ok(Uint::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Uint, E> {
            u64::try_from(v)
                .map(Uint::from)
                .map_err(|_| E::custom(format!("negative integer `{}`", v)))
        }

        fn visit_u128<E: de::Error>(self, v: u128) -> Result<Uint, E> {
            Ok(Uint::from(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Uint, E> {
            v.parse::<Uint>()
                .map_err(|_| E::custom(format!("invalid integer `{}`", v)))
        }

        // Integers past u64 arrive as a serde_json arbitrary-precision number
        fn visit_map<A: de::MapAccess<'de>>(self, map: A) -> Result<Uint, A::Error> {
            let number = serde_json::Number::deserialize(de::value::MapAccessDeserializer::new(map))?;
            self.visit_str(&number.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_round_trip() {
        for symbol in Symbol::ALL {
            assert_eq!(symbol.as_str().parse::<Symbol>().unwrap(), symbol);
        }
        assert_eq!(Symbol::Tkn.counterpart(), Symbol::Bnt);
        assert!(matches!("ETH".parse::<Symbol>(), Err(PoolError::UnknownSymbol(_))));
    }

    #[test]
    fn test_amount_from_json() {
        let exact: Amount = serde_json::from_str("500").unwrap();
        assert_eq!(exact, Amount::from(500));

        let all: Amount = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(all, Amount::All);

        let big: Amount = serde_json::from_str("\"340282366920938463463374607431768211456\"").unwrap();
        assert_eq!(big, Amount::Exact(Uint::from(1u8) << 128usize));

        assert!(serde_json::from_str::<Amount>("\"most\"").is_err());
        assert!(serde_json::from_str::<Amount>("-5").is_err());
        assert!(serde_json::from_str::<Amount>("1.5").is_err());
    }

    #[test]
    fn test_amount_resolve() {
        let balance = Uint::from(42u32);
        assert_eq!(Amount::All.resolve(&balance), balance);
        assert_eq!(Amount::from(7).resolve(&balance), Uint::from(7u32));
    }

    #[test]
    fn test_amount_above_u64() {
        let amount: Amount = serde_json::from_str("1000000000000000000000").unwrap();
        assert_eq!(amount, Amount::Exact(Uint::from(10u8).pow(21)));

        let max: Amount = serde_json::from_str(&max_uint().to_string()).unwrap();
        assert_eq!(max, Amount::Exact(max_uint()));
    }

    #[test]
    fn test_decimal_above_u64() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(with = "decimal")]
            value: Uint,
        }

        let held: Holder = serde_json::from_str(r#"{"value": 1000000000000000000000}"#).unwrap();
        assert_eq!(held.value, Uint::from(10u8).pow(21));
        let held: Holder = serde_json::from_str(r#"{"value": "42"}"#).unwrap();
        assert_eq!(held.value, Uint::from(42u8));
    }
}
