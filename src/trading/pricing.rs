//! Price and slippage-bound arithmetic.
//!
//! Trade bounds are computed from the curve's raw integer reserves with a single
//! integer division at the end, so the only rounding is the final one: down for
//! minimum-output bounds and token amounts, up for maximum-spend bounds. The program
//! validates bounds as raw integers, and a bound rounded the other way would be looser
//! than the trader asked for. Decimal prices are for reporting only.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::chain::curve::CurveState;

/// Decimal places of a lamport amount expressed in SOL.
const SOL_DECIMALS: u32 = 9;

/// Resolution of slippage fractions. Finer digits are truncated toward the trader.
const SLIPPAGE_DECIMALS: u32 = 9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("slippage {0} outside [0, 1)")]
    InvalidSlippage(Decimal),
    #[error("bonding curve has no reserves to price against")]
    EmptyReserves,
    #[error("amount {0} must be non-negative")]
    NegativeAmount(Decimal),
    #[error("amount does not fit in raw units")]
    Overflow,
}

fn check_slippage(slippage: Decimal) -> Result<(), PricingError> {
    if slippage < Decimal::ZERO || slippage >= Decimal::ONE {
        return Err(PricingError::InvalidSlippage(slippage));
    }
    Ok(())
}

/// `fraction` as `numerator / 10^scale`, truncated to `SLIPPAGE_DECIMALS` places.
fn fraction_parts(fraction: Decimal) -> (u128, u128) {
    let truncated = fraction.round_dp_with_strategy(SLIPPAGE_DECIMALS, RoundingStrategy::ToZero);
    (truncated.mantissa().unsigned_abs(), 10u128.pow(truncated.scale()))
}

fn to_u64(value: u128) -> Result<u64, PricingError> {
    u64::try_from(value).map_err(|_| PricingError::Overflow)
}

/// Raw token units to whole tokens.
pub fn raw_to_ui_amount(raw: u64, decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(raw as i128, decimals)
}

/// Whole tokens to raw units, truncating sub-unit dust.
pub fn ui_to_raw_amount(amount: Decimal, decimals: u32) -> Result<u64, PricingError> {
    if amount < Decimal::ZERO {
        return Err(PricingError::NegativeAmount(amount));
    }
    amount
        .checked_mul(Decimal::from(10u64.pow(decimals)))
        .ok_or(PricingError::Overflow)?
        .floor()
        .to_u64()
        .ok_or(PricingError::Overflow)
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    raw_to_ui_amount(lamports, SOL_DECIMALS)
}

pub fn sol_to_lamports(sol: Decimal) -> Result<u64, PricingError> {
    ui_to_raw_amount(sol, SOL_DECIMALS)
}

/// Lamports `token_amount` raw units are worth at the curve's spot price, rounded down.
pub fn expected_sol_output(token_amount: u64, curve: &CurveState) -> Result<u64, PricingError> {
    min_sol_output(token_amount, curve, Decimal::ZERO)
}

/// Minimum lamports a sell must return:
/// `floor(token_amount * virtual_sol / virtual_token * (1 - slippage))`.
///
/// With 6 token decimals and 9 SOL decimals this equals
/// `floor(tokens * price * (1 - slippage) * LAMPORTS_PER_SOL)` evaluated exactly.
pub fn min_sol_output(
    token_amount: u64,
    curve: &CurveState,
    slippage: Decimal,
) -> Result<u64, PricingError> {
    check_slippage(slippage)?;
    if curve.virtual_token_reserves == 0 {
        return Err(PricingError::EmptyReserves);
    }

    let numerator = token_amount as u128 * curve.virtual_sol_reserves as u128;
    let denominator = curve.virtual_token_reserves as u128;
    let whole = to_u64(numerator / denominator)? as u128;
    let rest = numerator % denominator;

    // Both products stay below 2^94: whole and rest are under 2^64, keep under 10^9
    let (keep, scale) = fraction_parts(Decimal::ONE - slippage);
    let scaled = whole * keep + rest * keep / denominator;
    to_u64(scaled / scale)
}

/// Raw token units a budget of `lamports` buys at the curve's spot price, rounded down.
pub fn token_amount_for_budget(lamports: u64, curve: &CurveState) -> Result<u64, PricingError> {
    if curve.virtual_sol_reserves == 0 {
        return Err(PricingError::EmptyReserves);
    }
    let numerator = lamports as u128 * curve.virtual_token_reserves as u128;
    to_u64(numerator / curve.virtual_sol_reserves as u128)
}

/// Maximum lamports a buy may spend: `ceil(lamports * (1 + slippage))`.
pub fn max_sol_cost(lamports: u64, slippage: Decimal) -> Result<u64, PricingError> {
    check_slippage(slippage)?;
    let (extra, scale) = fraction_parts(slippage);
    let total = lamports as u128 * (scale + extra);
    to_u64((total + scale - 1) / scale)
}
