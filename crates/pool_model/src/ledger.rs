//! Fungible balance ledger
//!
//! Mutations are split into a checked `stage_*` step that computes the
//! post-state and an infallible [`Ledger::apply`] that writes it. Callers
//! touching several ledgers stage all of them first, so a failure anywhere
//! leaves every ledger untouched.
//!
//! # Invariants
//! - `total_supply == Σ balance_of`
//! - every balance lies in [0, 2^256 - 1]

use std::collections::BTreeMap;

use log::debug;
use num_traits::Zero;

use crate::math::{add, sub};
use crate::snapshot::LedgerSnapshot;
use crate::{PoolError, Result, Uint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    symbol: String,
    total_supply: Uint,
    balance_of: BTreeMap<String, Uint>,
}

/// Post-state of one staged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a staged update does nothing until applied"]
pub struct LedgerUpdate {
    total_supply: Uint,
    balances: Vec<(String, Uint)>,
}

impl Ledger {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            total_supply: Uint::zero(),
            balance_of: BTreeMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> &Uint {
        &self.total_supply
    }

    pub fn is_registered(&self, user: &str) -> bool {
        self.balance_of.contains_key(user)
    }

    /// Balance of a tracked account
    pub fn balance_of(&self, user: &str) -> Result<&Uint> {
        self.balance_of
            .get(user)
            .ok_or_else(|| PoolError::UnknownAccount {
                ledger: self.symbol.clone(),
                account: user.to_string(),
            })
    }

    /// Start tracking `user` with a zero balance
    ///
    /// Registering an account again is a no-op while its balance is zero and
    /// an error otherwise, since resetting a funded account would break the
    /// supply invariant.
    pub fn register(&mut self, user: &str) -> Result<()> {
        match self.balance_of.get(user) {
            Some(balance) if !balance.is_zero() => Err(PoolError::AlreadyRegistered {
                ledger: self.symbol.clone(),
                account: user.to_string(),
            }),
            _ => {
                self.balance_of.insert(user.to_string(), Uint::zero());
                Ok(())
            }
        }
    }

    pub fn mint(&mut self, user: &str, amount: &Uint) -> Result<()> {
        let update = self.stage_mint(user, amount)?;
        self.apply(update);
        debug!("{}: minted {} to {}", self.symbol, amount, user);
        Ok(())
    }

    pub fn burn(&mut self, user: &str, amount: &Uint) -> Result<()> {
        let update = self.stage_burn(user, amount)?;
        self.apply(update);
        debug!("{}: burned {} from {}", self.symbol, amount, user);
        Ok(())
    }

    /// Move `amount` between accounts; total supply is unchanged
    pub fn transfer(&mut self, source: &str, target: &str, amount: &Uint) -> Result<()> {
        let update = self.stage_transfer(source, target, amount)?;
        self.apply(update);
        debug!("{}: transferred {} from {} to {}", self.symbol, amount, source, target);
        Ok(())
    }

    pub fn stage_mint(&self, user: &str, amount: &Uint) -> Result<LedgerUpdate> {
        let balance = add(self.balance_of(user)?, amount)?;
        let total_supply = add(&self.total_supply, amount)?;
        Ok(LedgerUpdate {
            total_supply,
            balances: vec![(user.to_string(), balance)],
        })
    }

    pub fn stage_burn(&self, user: &str, amount: &Uint) -> Result<LedgerUpdate> {
        let balance = sub(self.balance_of(user)?, amount)?;
        let total_supply = sub(&self.total_supply, amount)?;
        Ok(LedgerUpdate {
            total_supply,
            balances: vec![(user.to_string(), balance)],
        })
    }

    pub fn stage_transfer(&self, source: &str, target: &str, amount: &Uint) -> Result<LedgerUpdate> {
        let source_balance = sub(self.balance_of(source)?, amount)?;
        let target_balance = self.balance_of(target)?;

        // Self-transfer: debit then credit the same slot
        if source == target {
            return Ok(LedgerUpdate {
                total_supply: self.total_supply.clone(),
                balances: vec![(source.to_string(), target_balance.clone())],
            });
        }

        let target_balance = add(target_balance, amount)?;
        Ok(LedgerUpdate {
            total_supply: self.total_supply.clone(),
            balances: vec![
                (source.to_string(), source_balance),
                (target.to_string(), target_balance),
            ],
        })
    }

    /// Write a staged post-state
    pub fn apply(&mut self, update: LedgerUpdate) {
        self.total_supply = update.total_supply;
        for (user, balance) in update.balances {
            self.balance_of.insert(user, balance);
        }
    }

    /// Read-only copy of supply and balances
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total_supply: self.total_supply.clone(),
            balance_of: self.balance_of.clone(),
        }
    }

    /// Σ balance_of, for invariant checks
    pub fn sum_of_balances(&self) -> Uint {
        self.balance_of.values().sum()
    }
}
