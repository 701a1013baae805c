//! One side of a pool: a reserve ledger and its pool-share ledger
//!
//! `reserve_staked` is the accounted reserve. It moves with deposits,
//! withdrawals and fee accrual, and diverges from the pool-held reserve
//! balance whenever swaps shift the curve. [`crate::Pool::close_arbitrage`]
//! reconciles the two.

use log::debug;
use num_traits::Zero;

use crate::ledger::{Ledger, LedgerUpdate};
use crate::math::{add, ratio, sub};
use crate::snapshot::BranchSnapshot;
use crate::{Amount, PoolError, Result, Uint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub(crate) reserve_rate: Uint,
    pub(crate) reserve_staked: Uint,
    pub(crate) reserve_token: Ledger,
    pub(crate) pool_token: Ledger,
}

/// Checked post-state of a liquidity change
#[must_use = "a staged liquidity change does nothing until applied"]
pub(crate) struct StagedLiquidity {
    reserve: LedgerUpdate,
    shares: LedgerUpdate,
    reserve_staked: Uint,
}

impl Branch {
    /// Wrap a reserve ledger; the share ledger is named `pool<SYMBOL>`
    pub fn new(reserve_token: Ledger) -> Self {
        let pool_token = Ledger::new(format!("pool{}", reserve_token.symbol()));
        Self {
            reserve_rate: Uint::zero(),
            reserve_staked: Uint::zero(),
            reserve_token,
            pool_token,
        }
    }

    pub fn reserve_rate(&self) -> &Uint {
        &self.reserve_rate
    }

    pub fn set_reserve_rate(&mut self, rate: Uint) {
        self.reserve_rate = rate;
    }

    pub fn reserve_staked(&self) -> &Uint {
        &self.reserve_staked
    }

    pub fn reserve_token(&self) -> &Ledger {
        &self.reserve_token
    }

    pub fn pool_token(&self) -> &Ledger {
        &self.pool_token
    }

    pub(crate) fn reserve_token_mut(&mut self) -> &mut Ledger {
        &mut self.reserve_token
    }

    pub(crate) fn pool_token_mut(&mut self) -> &mut Ledger {
        &mut self.pool_token
    }

    /// Reserve balance held by `id`
    pub fn reserve_balance(&self, id: &str) -> Result<&Uint> {
        self.reserve_token.balance_of(id)
    }

    /// Deposit reserve tokens and mint proportional pool shares
    ///
    /// Shares issued = `ratio(reserve, share_supply, reserve_staked)`. An
    /// empty branch (no stake, no shares) issues 1:1. Returns the shares
    /// minted.
    pub fn add_liquidity(&mut self, pool_id: &str, user: &str, amount: &Amount) -> Result<Uint> {
        let (staged, reserve_amount, supply_amount) = self.stage_add_liquidity(pool_id, user, amount)?;
        self.apply(staged);
        debug!(
            "{}: {} deposited {} for {} shares",
            self.reserve_token.symbol(),
            user,
            reserve_amount,
            supply_amount
        );
        Ok(supply_amount)
    }

    /// Burn pool shares and withdraw the proportional reserve
    ///
    /// Reserve returned = `ratio(shares, reserve_staked, share_supply)`.
    /// Returns the reserve amount paid out.
    pub fn rem_liquidity(&mut self, pool_id: &str, user: &str, amount: &Amount) -> Result<Uint> {
        let (staged, reserve_amount, supply_amount) = self.stage_rem_liquidity(pool_id, user, amount)?;
        self.apply(staged);
        debug!(
            "{}: {} burned {} shares for {}",
            self.reserve_token.symbol(),
            user,
            supply_amount,
            reserve_amount
        );
        Ok(reserve_amount)
    }

    fn stage_add_liquidity(
        &self,
        pool_id: &str,
        user: &str,
        amount: &Amount,
    ) -> Result<(StagedLiquidity, Uint, Uint)> {
        let reserve_amount = amount.resolve(self.reserve_token.balance_of(user)?);
        let supply = self.pool_token.total_supply();

        // Outstanding shares backed by nothing: no price to issue at
        if self.reserve_staked.is_zero() && !supply.is_zero() {
            return Err(PoolError::DivisionByZero);
        }
        let supply_amount = ratio(&reserve_amount, supply, &self.reserve_staked)?;

        let staged = StagedLiquidity {
            reserve: self.reserve_token.stage_transfer(user, pool_id, &reserve_amount)?,
            shares: self.pool_token.stage_mint(user, &supply_amount)?,
            reserve_staked: add(&self.reserve_staked, &reserve_amount)?,
        };
        Ok((staged, reserve_amount, supply_amount))
    }

    fn stage_rem_liquidity(
        &self,
        pool_id: &str,
        user: &str,
        amount: &Amount,
    ) -> Result<(StagedLiquidity, Uint, Uint)> {
        let supply_amount = amount.resolve(self.pool_token.balance_of(user)?);
        let reserve_amount = ratio(&supply_amount, &self.reserve_staked, self.pool_token.total_supply())?;

        let staged = StagedLiquidity {
            shares: self.pool_token.stage_burn(user, &supply_amount)?,
            reserve: self.reserve_token.stage_transfer(pool_id, user, &reserve_amount)?,
            reserve_staked: sub(&self.reserve_staked, &reserve_amount)?,
        };
        Ok((staged, reserve_amount, supply_amount))
    }

    fn apply(&mut self, staged: StagedLiquidity) {
        self.reserve_token.apply(staged.reserve);
        self.pool_token.apply(staged.shares);
        self.reserve_staked = staged.reserve_staked;
    }

    pub fn snapshot(&self) -> BranchSnapshot {
        BranchSnapshot {
            reserve_rate: self.reserve_rate.clone(),
            reserve_staked: self.reserve_staked.clone(),
            reserve_token: self.reserve_token.snapshot(),
            pool_token: self.pool_token.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POOL: &str = "pool";

    fn u(v: u64) -> Uint {
        Uint::from(v)
    }

    fn funded_branch(users: &[(&str, u64)]) -> Branch {
        let mut branch = Branch::new(Ledger::new("TKN"));
        branch.reserve_token_mut().register(POOL).unwrap();
        for (user, amount) in users {
            branch.pool_token_mut().register(user).unwrap();
            branch.reserve_token_mut().register(user).unwrap();
            branch.reserve_token_mut().mint(user, &u(*amount)).unwrap();
        }
        branch
    }

    #[test]
    fn test_first_deposit_is_one_to_one() {
        let mut branch = funded_branch(&[("user1", 1000)]);

        let shares = branch.add_liquidity(POOL, "user1", &Amount::from(500)).unwrap();

        assert_eq!(shares, u(500));
        assert_eq!(branch.reserve_staked(), &u(500));
        assert_eq!(branch.pool_token().total_supply(), &u(500));
        assert_eq!(branch.reserve_balance(POOL).unwrap(), &u(500));
        assert_eq!(branch.reserve_balance("user1").unwrap(), &u(500));
        assert_eq!(branch.pool_token().symbol(), "poolTKN");
    }

    #[test]
    fn test_deposit_after_fee_accrual_issues_fewer_shares() {
        let mut branch = funded_branch(&[("user1", 1000), ("user2", 1000)]);
        branch.add_liquidity(POOL, "user1", &Amount::from(500)).unwrap();
        // Fees accrue to the stake without minting shares
        branch.reserve_staked = u(600);

        let shares = branch.add_liquidity(POOL, "user2", &Amount::from(300)).unwrap();

        // floor(300 * 500 / 600)
        assert_eq!(shares, u(250));
        assert_eq!(branch.reserve_staked(), &u(900));
    }

    #[test]
    fn test_add_all_then_remove_all_round_trip() {
        let mut branch = funded_branch(&[("user1", 1000), ("user2", 777)]);
        branch.add_liquidity(POOL, "user1", &Amount::from(400)).unwrap();

        branch.add_liquidity(POOL, "user2", &Amount::All).unwrap();
        assert_eq!(branch.reserve_balance("user2").unwrap(), &u(0));

        let returned = branch.rem_liquidity(POOL, "user2", &Amount::All).unwrap();
        assert_eq!(returned, u(777));
        assert_eq!(branch.reserve_balance("user2").unwrap(), &u(777));
        assert_eq!(branch.pool_token().balance_of("user2").unwrap(), &u(0));
        assert_eq!(branch.reserve_staked(), &u(400));
    }

    #[test]
    fn test_stake_without_supply_cannot_issue() {
        let mut branch = funded_branch(&[("user1", 1000)]);
        branch.add_liquidity(POOL, "user1", &Amount::from(100)).unwrap();
        branch.reserve_staked = u(0);
        let before = branch.clone();

        let result = branch.add_liquidity(POOL, "user1", &Amount::from(100));

        assert_eq!(result, Err(PoolError::DivisionByZero));
        assert_eq!(branch, before);
    }

    #[test]
    fn test_failed_deposit_leaves_branch_untouched() {
        let mut branch = funded_branch(&[("user1", 100)]);
        let before = branch.clone();

        let result = branch.add_liquidity(POOL, "user1", &Amount::from(101));

        assert_eq!(result, Err(PoolError::Underflow));
        assert_eq!(branch, before);
    }

    #[test]
    fn test_unregistered_provider() {
        let mut branch = funded_branch(&[]);
        let result = branch.add_liquidity(POOL, "ghost", &Amount::All);
        assert!(matches!(result, Err(PoolError::UnknownAccount { .. })));
        assert!(matches!(branch.reserve_balance("ghost"), Err(PoolError::UnknownAccount { .. })));
    }
}
