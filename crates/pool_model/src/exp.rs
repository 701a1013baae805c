//! Fixed-point exponential series
//!
//! Produces the constants for an on-chain `exp` over fixed-point inputs
//! scaled by `ONE = 2^max_precision`. The input splits into a low part
//! `y = x mod 2^k_min`, approximated with a truncated Taylor series, and
//! high bits, each multiplying the result by `e^(2^k)` as a `num/den` pair
//! sized so the product stays under 2^256.
//!
//! ```text
//! z = y = x % hi[0].bit
//! for t in lo[1..]:  z = z*y/ONE; n += z*t.val
//! n = n/lo[0].val + y + ONE
//! for t in hi[..-1]: if x & t.bit != 0 { n = n*t.num/t.den }
//! ```

use log::debug;
use num_traits::{One, Zero};
use serde::Deserialize;

use crate::math::{add, div, mul, sub};
use crate::{max_uint, PoolError, Result, Uint};

/// Fractional bits used when evaluating `e^(2^k)` for the high terms
const FRAC_BITS: usize = 512;

/// e^(2^8) alone needs more than 256 bits
const MAX_HI_TERM_VAL_LIMIT: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpParams {
    /// `ONE = 1 << max_precision`
    pub max_precision: u32,
    /// Inputs must be below `2^max_hi_term_val` (in units of ONE)
    pub max_hi_term_val: u32,
    /// High terms cover `e^(2^k)` for
    /// `k = max_hi_term_val - num_of_hi_terms ..= max_hi_term_val`
    pub num_of_hi_terms: u32,
}

impl Default for ExpParams {
    fn default() -> Self {
        Self {
            max_precision: 127,
            max_hi_term_val: 4,
            num_of_hi_terms: 7,
        }
    }
}

impl ExpParams {
    /// Reject parameters whose terms cannot be computed within 2^256
    ///
    /// The lowest exponent `2^k` must keep `k >= -FRAC_BITS`, and
    /// `e^(2^max_hi_term_val) * ONE` must stay below 2^256.
    pub fn validate(&self) -> Result<()> {
        let lowest = self.max_hi_term_val as i64 - self.num_of_hi_terms as i64;
        if lowest < -(FRAC_BITS as i64) {
            return Err(PoolError::InvalidExpParams(format!(
                "num_of_hi_terms {} reaches below e^(2^-{})",
                self.num_of_hi_terms, FRAC_BITS
            )));
        }
        if self.max_hi_term_val >= MAX_HI_TERM_VAL_LIMIT {
            return Err(PoolError::InvalidExpParams(format!(
                "max_hi_term_val {} exceeds {}",
                self.max_hi_term_val,
                MAX_HI_TERM_VAL_LIMIT - 1
            )));
        }
        // log2(e) < 1443/1000
        let exp_bits = ((1u64 << self.max_hi_term_val) * 1443).div_ceil(1000);
        if exp_bits + self.max_precision as u64 >= 256 {
            return Err(PoolError::InvalidExpParams(format!(
                "e^{} at precision {} does not fit in 256 bits",
                1u64 << self.max_hi_term_val,
                self.max_precision
            )));
        }
        Ok(())
    }
}

/// Multiplier `num/den ≈ e^(2^k)` applied when `bit` is set in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiTerm {
    pub bit: Uint,
    pub num: Uint,
    pub den: Uint,
}

/// Taylor coefficient `val = N!/ind!` (N = number of low terms);
/// `lo[0].val = N!` is the common divisor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoTerm {
    pub val: Uint,
    pub ind: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpSeries {
    params: ExpParams,
    one: Uint,
    hi_terms: Vec<HiTerm>,
    lo_terms: Vec<LoTerm>,
}

impl ExpSeries {
    /// Generate high and low terms for `params`
    ///
    /// Low terms grow one order at a time for as long as the value at the
    /// largest admissible input keeps increasing.
    pub fn generate(params: ExpParams) -> Result<Self> {
        params.validate()?;
        let one = Uint::one() << params.max_precision as usize;
        let hi_terms = hi_terms(&params, &one)?;
        let max_val = sub(&hi_terms[hi_terms.len() - 1].bit, &Uint::one())?;

        let mut lo_terms = vec![LoTerm { val: Uint::one(), ind: 1 }];
        let mut res = evaluate(&max_val, &hi_terms, &lo_terms, &one)?;
        loop {
            let next = lo_terms_of_order(lo_terms.len() as u32 + 1);
            let res_next = evaluate(&max_val, &hi_terms, &next, &one)?;
            if res < res_next {
                res = res_next;
                lo_terms = next;
            } else {
                break;
            }
        }
        debug!(
            "exp series: {} hi terms, {} lo terms, exp(max) = {:#x}",
            hi_terms.len(),
            lo_terms.len(),
            res
        );

        Ok(Self {
            params,
            one,
            hi_terms,
            lo_terms,
        })
    }

    pub fn params(&self) -> &ExpParams {
        &self.params
    }

    /// Fixed-point 1.0
    pub fn one(&self) -> &Uint {
        &self.one
    }

    pub fn hi_terms(&self) -> &[HiTerm] {
        &self.hi_terms
    }

    pub fn lo_terms(&self) -> &[LoTerm] {
        &self.lo_terms
    }

    /// Exclusive upper bound on inputs
    pub fn max_input(&self) -> &Uint {
        &self.hi_terms[self.hi_terms.len() - 1].bit
    }

    /// `e^(x/ONE) * ONE`, approximately
    pub fn exp(&self, x: &Uint) -> Result<Uint> {
        if x >= self.max_input() {
            return Err(PoolError::ExpValueTooHigh);
        }
        evaluate(x, &self.hi_terms, &self.lo_terms, &self.one)
    }
}

fn evaluate(x: &Uint, hi_terms: &[HiTerm], lo_terms: &[LoTerm], one: &Uint) -> Result<Uint> {
    let y = x % &hi_terms[0].bit;
    let mut z = y.clone();
    let mut res = Uint::zero();

    for term in &lo_terms[1..] {
        z = div(&mul(&z, &y)?, one)?;
        res = add(&res, &mul(&z, &term.val)?)?;
    }
    res = add(&add(&div(&res, &lo_terms[0].val)?, &y)?, one)?;

    for term in &hi_terms[..hi_terms.len() - 1] {
        if !(x & &term.bit).is_zero() {
            res = div(&mul(&res, &term.num)?, &term.den)?;
        }
    }
    Ok(res)
}

fn hi_terms(params: &ExpParams, one: &Uint) -> Result<Vec<HiTerm>> {
    let max = max_uint();
    let lowest = params.max_hi_term_val as i64 - params.num_of_hi_terms as i64;

    let mut top = sub(&((e_pow2_fixed(lowest) * one) >> FRAC_BITS), &Uint::one())?;
    let mut terms = Vec::with_capacity(params.num_of_hi_terms as usize + 1);

    for n in 0..=params.num_of_hi_terms {
        let cur = e_pow2_fixed(lowest + n as i64);
        let den = div(&(&max << FRAC_BITS), &(&cur * &top))?;
        let num = (&den * &cur) >> FRAC_BITS;
        top = div(&(&top * &num), &den)?;
        let bit = (one << (n + params.max_hi_term_val) as usize) >> params.num_of_hi_terms as usize;
        terms.push(HiTerm { bit, num, den });
    }
    Ok(terms)
}

/// `[N!/1!, N!/2!, ..., N!/N!]` with indices 1..=N
fn lo_terms_of_order(order: u32) -> Vec<LoTerm> {
    let total = factorial(order);
    (1..=order)
        .map(|ind| LoTerm {
            val: &total / factorial(ind),
            ind,
        })
        .collect()
}

fn factorial(n: u32) -> Uint {
    (1..=n).fold(Uint::one(), |acc, i| acc * i)
}

/// `e^(2^k)` scaled by `2^FRAC_BITS`, via the Taylor series
fn e_pow2_fixed(k: i64) -> Uint {
    let unit = Uint::one() << FRAC_BITS;
    let x = Uint::one() << (FRAC_BITS as i64 + k) as usize;

    let mut sum = unit.clone();
    let mut term = unit;
    let mut n = 1u32;
    loop {
        term = ((term * &x) >> FRAC_BITS) / n;
        if term.is_zero() {
            break;
        }
        sum += &term;
        n += 1;
    }
    sum
}
