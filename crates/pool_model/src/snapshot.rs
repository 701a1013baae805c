//! Read-only views of pool state for reports and comparisons

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::{decimal, Symbol, Uint};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(with = "decimal")]
    pub total_supply: Uint,
    #[serde(serialize_with = "decimal_map")]
    pub balance_of: BTreeMap<String, Uint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchSnapshot {
    #[serde(with = "decimal")]
    pub reserve_rate: Uint,
    #[serde(with = "decimal")]
    pub reserve_staked: Uint,
    pub reserve_token: LedgerSnapshot,
    pub pool_token: LedgerSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    #[serde(rename = "swapFee")]
    pub swap_fee: u32,
    #[serde(rename = "TKN")]
    pub tkn: BranchSnapshot,
    #[serde(rename = "BNT")]
    pub bnt: BranchSnapshot,
}

fn decimal_map<S: Serializer>(map: &BTreeMap<String, Uint>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_map(map.iter().map(|(k, v)| (k, v.to_string())))
}

impl LedgerSnapshot {
    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, String>) {
        out.insert(format!("{}.totalSupply", prefix), self.total_supply.to_string());
        for (user, balance) in &self.balance_of {
            out.insert(format!("{}.balanceOf.{}", prefix, user), balance.to_string());
        }
    }
}

impl BranchSnapshot {
    fn flatten_into(&self, prefix: &str, out: &mut BTreeMap<String, String>) {
        out.insert(format!("{}.reserveRate", prefix), self.reserve_rate.to_string());
        out.insert(format!("{}.reserveStaked", prefix), self.reserve_staked.to_string());
        self.reserve_token.flatten_into(&format!("{}.reserveToken", prefix), out);
        self.pool_token.flatten_into(&format!("{}.poolToken", prefix), out);
    }
}

impl PoolSnapshot {
    pub fn branch(&self, symbol: Symbol) -> &BranchSnapshot {
        match symbol {
            Symbol::Tkn => &self.tkn,
            Symbol::Bnt => &self.bnt,
        }
    }

    /// Dotted-path view, e.g. `TKN.reserveToken.balanceOf.user1`
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        out.insert("swapFee".to_string(), self.swap_fee.to_string());
        for symbol in Symbol::ALL {
            self.branch(symbol).flatten_into(symbol.as_str(), &mut out);
        }
        out
    }
}
