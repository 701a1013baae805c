//! Bounded integer math over [0, 2^256 - 1]
//!
//! Every primitive returns a `PoolError` instead of leaving the range, so a
//! failed step can abort the surrounding operation before any state changes.

use num_traits::Zero;

use crate::{max_uint, PoolError, Result, Uint};

/// a + b, failing above 2^256 - 1
pub fn add(a: &Uint, b: &Uint) -> Result<Uint> {
    let sum = a + b;
    if sum > max_uint() {
        return Err(PoolError::Overflow);
    }
    Ok(sum)
}

/// a - b, failing below zero
pub fn sub(a: &Uint, b: &Uint) -> Result<Uint> {
    if a < b {
        return Err(PoolError::Underflow);
    }
    Ok(a - b)
}

/// a * b, failing above 2^256 - 1
pub fn mul(a: &Uint, b: &Uint) -> Result<Uint> {
    let product = a * b;
    if product > max_uint() {
        return Err(PoolError::Overflow);
    }
    Ok(product)
}

/// floor(a / b)
pub fn div(a: &Uint, b: &Uint) -> Result<Uint> {
    if b.is_zero() {
        return Err(PoolError::DivisionByZero);
    }
    Ok(a / b)
}

/// floor(x * n / d), with `x` returned untouched when `n == d`
///
/// The identity short-circuit also covers `n == d == 0`, so a ratio against
/// an empty supply and an empty stake is exact rather than a division error.
pub fn ratio(x: &Uint, n: &Uint, d: &Uint) -> Result<Uint> {
    if n == d {
        return Ok(x.clone());
    }
    mul_div(x, n, d)
}

/// floor(x * n / d) via [`mul`] then [`div`]
pub fn mul_div(x: &Uint, n: &Uint, d: &Uint) -> Result<Uint> {
    div(&mul(x, n)?, d)
}

/// Constant product (x·y=k) swap output
///
/// Adding `x` to source reserve `X` releases `floor(Y*x / (X+x))` from target
/// reserve `Y`.
pub fn swap(source_reserve: &Uint, target_reserve: &Uint, amount: &Uint) -> Result<Uint> {
    div(
        &mul(target_reserve, amount)?,
        &add(source_reserve, amount)?,
    )
}

/// Source amount needed to draw `out` from a constant product pool
///
/// With target reserve `X` and source reserve `Y`, returns
/// `ceil(Y*out / (X - out))`. Feeding the result into [`swap`] yields at
/// least `out`.
pub fn swap_inverse(target_reserve: &Uint, source_reserve: &Uint, out: &Uint) -> Result<Uint> {
    let remaining = sub(target_reserve, out)?;
    let numerator = mul(source_reserve, out)?;
    let quotient = div(&numerator, &remaining)?;
    if (&numerator % &remaining).is_zero() {
        Ok(quotient)
    } else {
        add(&quotient, &Uint::from(1u8))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(v: u64) -> Uint {
        Uint::from(v)
    }

    fn pow2(bits: usize) -> Uint {
        Uint::from(1u8) << bits
    }

    #[test]
    fn test_add_boundary() {
        let max = max_uint();
        assert_eq!(add(&max, &u(0)).unwrap(), max);
        assert_eq!(add(&max, &u(1)), Err(PoolError::Overflow));
        assert_eq!(add(&u(2), &u(3)).unwrap(), u(5));
    }

    #[test]
    fn test_sub_underflow() {
        assert_eq!(sub(&u(5), &u(5)).unwrap(), u(0));
        assert_eq!(sub(&u(4), &u(5)), Err(PoolError::Underflow));
    }

    #[test]
    fn test_mul_overflow() {
        // 2^200 * 2^200 = 2^400
        assert_eq!(mul(&pow2(200), &pow2(200)), Err(PoolError::Overflow));
        // 2^128 * 2^127 still fits
        assert_eq!(mul(&pow2(128), &pow2(127)).unwrap(), pow2(255));
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(div(&u(5), &u(0)), Err(PoolError::DivisionByZero));
        assert_eq!(div(&u(7), &u(2)).unwrap(), u(3));
    }

    #[test]
    fn test_ratio_identity_skips_rounding() {
        // Identity holds even where mul would overflow
        let x = max_uint();
        assert_eq!(ratio(&x, &u(3), &u(3)).unwrap(), x);
        assert_eq!(ratio(&u(500), &u(0), &u(0)).unwrap(), u(500));
        assert_eq!(ratio(&u(10), &u(1), &u(3)).unwrap(), u(3));
        assert_eq!(ratio(&u(10), &u(1), &u(0)), Err(PoolError::DivisionByZero));
    }

    #[test]
    fn test_swap_formula() {
        // floor(1000 * 100 / 1100) = 90
        assert_eq!(swap(&u(1000), &u(1000), &u(100)).unwrap(), u(90));
        assert_eq!(swap(&u(0), &u(0), &u(0)), Err(PoolError::DivisionByZero));
    }

    #[test]
    fn test_swap_inverse_rounds_up() {
        // ceil(417 * 100 / 500) = 84
        assert_eq!(swap_inverse(&u(600), &u(417), &u(100)).unwrap(), u(84));
        // Exact quotient is not bumped
        assert_eq!(swap_inverse(&u(200), &u(100), &u(100)).unwrap(), u(100));

        assert_eq!(swap_inverse(&u(100), &u(100), &u(100)), Err(PoolError::DivisionByZero));
        assert_eq!(swap_inverse(&u(99), &u(100), &u(100)), Err(PoolError::Underflow));
    }

    #[test]
    fn test_swap_inverse_covers_requested_output() {
        let (x, y) = (u(1_234_567), u(987_654));
        for out in [1u64, 17, 5_000, 600_000, 1_234_000] {
            let input = swap_inverse(&x, &y, &u(out)).unwrap();
            assert!(swap(&y, &x, &input).unwrap() >= u(out));
        }
    }
}
