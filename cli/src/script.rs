//! Command scripts replayed against a pool
//!
//! A script is a JSON array of operations tagged by `operation`. After each
//! operation the flattened pool snapshot is appended to the history, which
//! becomes one CSV row in the report.

use std::collections::BTreeMap;

use log::{info, warn};
use num_traits::ToPrimitive;
use pool_model::{new_pool, Amount, Pool, PoolError, Symbol, Uint};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Command {
    #[serde(rename_all = "camelCase")]
    NewPool {
        #[serde(deserialize_with = "bounded")]
        swap_fee: u32,
        #[serde(deserialize_with = "bounded")]
        num_of_users: usize,
        #[serde(with = "pool_model::decimal")]
        initial_amount: Uint,
    },
    #[serde(rename_all = "camelCase")]
    SetRates {
        #[serde(with = "pool_model::decimal")]
        tkn_rate: Uint,
        #[serde(with = "pool_model::decimal")]
        bnt_rate: Uint,
    },
    AddLiquidity {
        token: Symbol,
        user: String,
        amount: Amount,
    },
    RemLiquidity {
        token: Symbol,
        user: String,
        amount: Amount,
    },
    #[serde(rename_all = "camelCase")]
    Swap {
        source_token: Symbol,
        target_token: Symbol,
        user: String,
        #[serde(with = "pool_model::decimal")]
        amount: Uint,
    },
    CloseArbitrage {
        user: String,
    },
}

/// Fixed-width field read through the decimal parser
///
/// Numbers inside the tagged enum are buffered in their arbitrary-precision
/// form, which the primitive deserializers do not accept.
fn bounded<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = pool_model::decimal::deserialize(deserializer)?;
    value
        .to_u64()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| D::Error::custom(format!("integer {} out of range", value)))
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::NewPool { .. } => "newPool",
            Command::SetRates { .. } => "setRates",
            Command::AddLiquidity { .. } => "addLiquidity",
            Command::RemLiquidity { .. } => "remLiquidity",
            Command::Swap { .. } => "swap",
            Command::CloseArbitrage { .. } => "closeArbitrage",
        }
    }
}

/// Script-level failures
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("command #{index} ({operation}) needs a pool; start the script with newPool")]
    NoPool { index: usize, operation: &'static str },
    #[error("command #{index} ({operation}) failed: {source}")]
    Pool {
        index: usize,
        operation: &'static str,
        #[source]
        source: PoolError,
    },
}

/// Replays commands and records a snapshot after each one
#[derive(Debug, Default)]
pub struct Simulation {
    pool: Option<Pool>,
    history: Vec<BTreeMap<String, String>>,
}

impl Simulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> Option<&Pool> {
        self.pool.as_ref()
    }

    /// Flattened snapshots, one per successful command
    pub fn history(&self) -> &[BTreeMap<String, String>] {
        &self.history
    }

    /// Run `commands` in order, stopping at the first failure
    ///
    /// History up to the failing command is kept.
    pub fn run(&mut self, commands: &[Command]) -> Result<(), SimError> {
        for (index, command) in commands.iter().enumerate() {
            if let Err(err) = self.apply(index, command) {
                warn!("{}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    fn pool_mut(&mut self, index: usize, operation: &'static str) -> Result<&mut Pool, SimError> {
        self.pool.as_mut().ok_or(SimError::NoPool { index, operation })
    }

    fn apply(&mut self, index: usize, command: &Command) -> Result<(), SimError> {
        let operation = command.name();
        info!("#{} {:?}", index, command);
        let wrap = |source| SimError::Pool { index, operation, source };

        match command {
            Command::NewPool { swap_fee, num_of_users, initial_amount } => {
                self.pool = Some(new_pool(*swap_fee, *num_of_users, initial_amount).map_err(wrap)?);
            }
            Command::SetRates { tkn_rate, bnt_rate } => {
                self.pool_mut(index, operation)?
                    .set_rates(tkn_rate.clone(), bnt_rate.clone());
            }
            Command::AddLiquidity { token, user, amount } => {
                self.pool_mut(index, operation)?
                    .add_liquidity(*token, user, amount)
                    .map_err(wrap)?;
            }
            Command::RemLiquidity { token, user, amount } => {
                self.pool_mut(index, operation)?
                    .rem_liquidity(*token, user, amount)
                    .map_err(wrap)?;
            }
            Command::Swap { source_token, target_token, user, amount } => {
                self.pool_mut(index, operation)?
                    .swap(*source_token, *target_token, user, amount)
                    .map_err(wrap)?;
            }
            Command::CloseArbitrage { user } => {
                self.pool_mut(index, operation)?
                    .close_arbitrage(user)
                    .map_err(wrap)?;
            }
        }

        if let Some(pool) = &self.pool {
            self.history.push(pool.snapshot().flatten());
        }
        Ok(())
    }
}

/// Parse a JSON script
pub fn parse_script(json: &str) -> serde_json::Result<Vec<Command>> {
    serde_json::from_str(json)
}
