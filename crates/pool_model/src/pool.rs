//! Two-branch pool: liquidity routing, constant product swaps, arbitrage
//!
//! The pool's own holdings live under the account `id` on each reserve
//! ledger. Swaps price against those pool-held balances, not against
//! `reserve_staked`; the gap between the two is what
//! [`Pool::close_arbitrage`] removes.

use std::cmp::Ordering;

use log::info;

use crate::branch::Branch;
use crate::ledger::Ledger;
use crate::math::{self, add, mul_div, sub, swap_inverse};
use crate::snapshot::PoolSnapshot;
use crate::{Amount, PoolError, Result, Symbol, Uint, PPM};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    id: String,
    swap_fee: u32,
    tkn: Branch,
    bnt: Branch,
}

/// Amounts moved by one swap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub source: Symbol,
    pub target: Symbol,
    /// Source tokens paid into the pool
    pub source_amount: Uint,
    /// Curve output before fees
    pub target_amount: Uint,
    /// Fee kept staked in the target branch
    pub fee: Uint,
    /// Target tokens paid to the user (`target_amount - fee`)
    pub received: Uint,
}

/// What [`Pool::close_arbitrage`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitrageOutcome {
    /// Pool-held TKN already matched the stake
    Balanced,
    /// Pool held less TKN than staked; the arbitrageur sold TKN for BNT
    SoldTkn(SwapOutcome),
    /// Pool held more TKN than staked; the arbitrageur bought TKN with BNT
    BoughtTkn(SwapOutcome),
}

impl Pool {
    /// Empty pool with fresh `TKN` and `BNT` ledgers
    ///
    /// `swap_fee` is in ppm and must not exceed [`PPM`].
    pub fn new(id: impl Into<String>, swap_fee: u32) -> Result<Self> {
        if swap_fee > PPM {
            return Err(PoolError::InvalidSwapFee(swap_fee));
        }
        Ok(Self {
            id: id.into(),
            swap_fee,
            tkn: Branch::new(Ledger::new(Symbol::Tkn.as_str())),
            bnt: Branch::new(Ledger::new(Symbol::Bnt.as_str())),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn swap_fee(&self) -> u32 {
        self.swap_fee
    }

    pub fn branch(&self, symbol: Symbol) -> &Branch {
        match symbol {
            Symbol::Tkn => &self.tkn,
            Symbol::Bnt => &self.bnt,
        }
    }

    pub fn branch_mut(&mut self, symbol: Symbol) -> &mut Branch {
        match symbol {
            Symbol::Tkn => &mut self.tkn,
            Symbol::Bnt => &mut self.bnt,
        }
    }

    /// (source, target) branches for a swap out of `source`
    fn pair(&self, source: Symbol) -> (&Branch, &Branch) {
        match source {
            Symbol::Tkn => (&self.tkn, &self.bnt),
            Symbol::Bnt => (&self.bnt, &self.tkn),
        }
    }

    fn pair_mut(&mut self, source: Symbol) -> (&mut Branch, &mut Branch) {
        match source {
            Symbol::Tkn => (&mut self.tkn, &mut self.bnt),
            Symbol::Bnt => (&mut self.bnt, &mut self.tkn),
        }
    }

    /// Reserve balance the pool account holds in `symbol`
    pub fn pool_balance(&self, symbol: Symbol) -> Result<&Uint> {
        self.branch(symbol).reserve_balance(&self.id)
    }

    /// Store the external reference prices
    pub fn set_rates(&mut self, tkn_rate: Uint, bnt_rate: Uint) {
        info!("set rates TKN={} BNT={}", tkn_rate, bnt_rate);
        self.tkn.set_reserve_rate(tkn_rate);
        self.bnt.set_reserve_rate(bnt_rate);
    }

    pub fn add_liquidity(&mut self, symbol: Symbol, user: &str, amount: &Amount) -> Result<Uint> {
        let id = self.id.clone();
        let shares = self.branch_mut(symbol).add_liquidity(&id, user, amount)?;
        info!("{} added {} liquidity for {} shares", user, symbol, shares);
        Ok(shares)
    }

    pub fn rem_liquidity(&mut self, symbol: Symbol, user: &str, amount: &Amount) -> Result<Uint> {
        let id = self.id.clone();
        let reserve = self.branch_mut(symbol).rem_liquidity(&id, user, amount)?;
        info!("{} removed {} {} of liquidity", user, reserve, symbol);
        Ok(reserve)
    }

    /// Price a swap against the current pool-held balances
    pub fn quote_swap(&self, source: Symbol, target: Symbol, amount: &Uint) -> Result<SwapOutcome> {
        if source == target {
            return Err(PoolError::SameSymbol(source));
        }
        let target_amount = math::swap(self.pool_balance(source)?, self.pool_balance(target)?, amount)?;
        let fee = mul_div(&target_amount, &Uint::from(self.swap_fee), &Uint::from(PPM))?;
        let received = sub(&target_amount, &fee)?;
        Ok(SwapOutcome {
            source,
            target,
            source_amount: amount.clone(),
            target_amount,
            fee,
            received,
        })
    }

    /// Sell `amount` of `source` for `target`
    ///
    /// The user pays `amount` into the pool and receives the curve output
    /// less the fee. The fee stays in the pool and is added to the target
    /// branch's stake, so it accrues to that branch's liquidity providers.
    pub fn swap(&mut self, source: Symbol, target: Symbol, user: &str, amount: &Uint) -> Result<SwapOutcome> {
        let outcome = self.quote_swap(source, target, amount)?;

        let (source_branch, target_branch) = self.pair(source);
        let source_update = source_branch.reserve_token.stage_transfer(user, &self.id, amount)?;
        let target_update = target_branch.reserve_token.stage_transfer(&self.id, user, &outcome.received)?;
        let target_staked = add(&target_branch.reserve_staked, &outcome.fee)?;

        let (source_branch, target_branch) = self.pair_mut(source);
        source_branch.reserve_token_mut().apply(source_update);
        target_branch.reserve_token_mut().apply(target_update);
        target_branch.reserve_staked = target_staked;

        info!(
            "{} swapped {} {} for {} {} (fee {})",
            user, amount, source, outcome.received, target, outcome.fee
        );
        Ok(outcome)
    }

    /// Trade the TKN branch back onto its stake
    ///
    /// With `gap = tkn.reserve_staked - pool-held TKN`:
    /// - `gap > 0`: `user` sells `gap` TKN for BNT.
    /// - `gap < 0`: `user` buys `|gap|` TKN, paying the BNT amount the
    ///   inverse constant product formula asks for.
    /// - `gap == 0`: nothing happens.
    pub fn close_arbitrage(&mut self, user: &str) -> Result<ArbitrageOutcome> {
        let staked = self.tkn.reserve_staked().clone();
        let held = self.pool_balance(Symbol::Tkn)?.clone();

        let outcome = match staked.cmp(&held) {
            Ordering::Equal => ArbitrageOutcome::Balanced,
            Ordering::Greater => {
                let amount = sub(&staked, &held)?;
                ArbitrageOutcome::SoldTkn(self.swap(Symbol::Tkn, Symbol::Bnt, user, &amount)?)
            }
            Ordering::Less => {
                let excess = sub(&held, &staked)?;
                let cost = swap_inverse(&held, self.pool_balance(Symbol::Bnt)?, &excess)?;
                ArbitrageOutcome::BoughtTkn(self.swap(Symbol::Bnt, Symbol::Tkn, user, &cost)?)
            }
        };
        info!("close arbitrage by {}: {:?}", user, outcome);
        Ok(outcome)
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            swap_fee: self.swap_fee,
            tkn: self.tkn.snapshot(),
            bnt: self.bnt.snapshot(),
        }
    }
}
