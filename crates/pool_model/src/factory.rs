//! Pool construction with simulated users

use log::info;

use crate::pool::Pool;
use crate::{Result, Symbol, Uint};

/// Account id the pool holds its reserves under
pub const POOL_ID: &str = "pool";

/// Id of the `n`th simulated user (1-based)
pub fn user_id(n: usize) -> String {
    format!("user{}", n)
}

/// Build a pool and seed `num_of_users` users with `initial_amount` of each
/// reserve token
///
/// The pool account is registered on both reserve ledgers with a zero
/// balance. Every user `user1..=userN` is registered on both reserve and both
/// share ledgers.
pub fn new_pool(swap_fee: u32, num_of_users: usize, initial_amount: &Uint) -> Result<Pool> {
    let mut pool = Pool::new(POOL_ID, swap_fee)?;

    for symbol in Symbol::ALL {
        let branch = pool.branch_mut(symbol);
        branch.reserve_token_mut().register(POOL_ID)?;
        for n in 1..=num_of_users {
            let user = user_id(n);
            branch.pool_token_mut().register(&user)?;
            branch.reserve_token_mut().register(&user)?;
            branch.reserve_token_mut().mint(&user, initial_amount)?;
        }
    }

    info!(
        "new pool: fee {} ppm, {} users with {} each",
        swap_fee, num_of_users, initial_amount
    );
    Ok(pool)
}
