//! Constant-product swap quoting.
//!
//! Output math follows the on-chain formula exactly:
//!   `out = out_reserve * in_after_fee / (in_reserve + in_after_fee)`
//! with fees deducted from the input side in basis points.

use crate::error::CoreError;
use crate::{
  BPS_DENOMINATOR, MAX_FEE_RATE_BPS, PRICE_IMPACT_CAP_PCT, SAFETY_MARGIN_BPS,
};

/// Matched reserve pair read from a single pool account fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReserves {
  pub token_reserve: u64,
  pub sol_reserve: u64,
  pub fee_rate_bps: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapDirection {
  /// Native asset in, token out.
  SolToToken,
  /// Token in, native asset out.
  TokenToSol,
}

/// Quote derived from one reserve snapshot. Never cached across reserve
/// changes; recompute on every input change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapQuote {
  pub direction: SwapDirection,
  pub input_amount: u64,
  /// Raw output after the pool fee, before slippage.
  pub expected_output: u64,
  /// Raw floor after slippage tolerance and the fixed safety margin.
  pub minimum_output: u64,
  /// Display-only figure, capped at [`PRICE_IMPACT_CAP_PCT`].
  pub price_impact_pct: f64,
}

/// Deducts the pool fee from an input amount. Floor division, so the
/// result never exceeds the input and equals it only at 0 bps.
pub fn deduct_fee(amount: u64, fee_rate_bps: u16) -> Result<u64, CoreError> {
  if fee_rate_bps > MAX_FEE_RATE_BPS {
    return Err(CoreError::InvalidFeeRate(fee_rate_bps));
  }
  let kept = BPS_DENOMINATOR - u64::from(fee_rate_bps);
  let after = u128::from(amount) * u128::from(kept) / u128::from(BPS_DENOMINATOR);
  u64::try_from(after).map_err(|_| CoreError::AmountOverflow)
}

/// Constant-product output for `amount_in` already net of fees.
pub fn constant_product_out(
  in_reserve: u64,
  out_reserve: u64,
  amount_in: u64,
) -> Result<u64, CoreError> {
  if in_reserve == 0 || out_reserve == 0 {
    return Err(CoreError::NoLiquidity);
  }
  let numerator = u128::from(out_reserve) * u128::from(amount_in);
  let denominator = u128::from(in_reserve) + u128::from(amount_in);
  let out = numerator / denominator;
  u64::try_from(out).map_err(|_| CoreError::AmountOverflow)
}

/// Applies slippage tolerance and then the fixed safety margin to an
/// expected output.
pub fn minimum_output(
  expected: u64,
  slippage_bps: u64,
) -> Result<u64, CoreError> {
  if slippage_bps >= BPS_DENOMINATOR {
    return Err(CoreError::InvalidSlippage(slippage_bps));
  }
  let after_slippage = u128::from(expected)
    * u128::from(BPS_DENOMINATOR - slippage_bps)
    / u128::from(BPS_DENOMINATOR);
  let after_margin = after_slippage * u128::from(SAFETY_MARGIN_BPS)
    / u128::from(BPS_DENOMINATOR);
  u64::try_from(after_margin).map_err(|_| CoreError::AmountOverflow)
}

/// Computes a full quote from one reserve snapshot.
///
/// # Errors
/// - [`CoreError::ZeroAmount`] on a zero input
/// - [`CoreError::NoLiquidity`] when either reserve is empty
/// - [`CoreError::InvalidFeeRate`] when the pool fee is out of range
/// - [`CoreError::InvalidSlippage`] when tolerance is 100% or more
pub fn quote_swap(
  reserves: &PoolReserves,
  direction: SwapDirection,
  input_amount: u64,
  slippage_bps: u64,
) -> Result<SwapQuote, CoreError> {
  if input_amount == 0 {
    return Err(CoreError::ZeroAmount);
  }
  let (in_reserve, out_reserve) = match direction {
    SwapDirection::SolToToken => (reserves.sol_reserve, reserves.token_reserve),
    SwapDirection::TokenToSol => (reserves.token_reserve, reserves.sol_reserve),
  };
  if in_reserve == 0 || out_reserve == 0 {
    return Err(CoreError::NoLiquidity);
  }
  let after_fee = deduct_fee(input_amount, reserves.fee_rate_bps)?;
  let expected = constant_product_out(in_reserve, out_reserve, after_fee)?;
  let minimum = minimum_output(expected, slippage_bps)?;
  Ok(SwapQuote {
    direction,
    input_amount,
    expected_output: expected,
    minimum_output: minimum,
    price_impact_pct: price_impact_pct(input_amount, in_reserve),
  })
}

fn price_impact_pct(input_amount: u64, in_reserve: u64) -> f64 {
  let pct = input_amount as f64 / in_reserve as f64 * 100.0;
  pct.min(PRICE_IMPACT_CAP_PCT)
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  const POOL: PoolReserves = PoolReserves {
    token_reserve: 1_000_000_000_000,
    sol_reserve: 10_000_000_000,
    fee_rate_bps: 30,
  };

  #[test]
  fn zero_fee_round_numbers() {
    // 100/100 reserves, 10 in: 100*10/110 = 9 after flooring.
    let out = constant_product_out(100, 100, 10).unwrap();
    assert_eq!(out, 9);
  }

  #[test]
  fn one_sol_into_ten_sol_pool() {
    // 1M tokens (6dp) against 10 SOL, 30 bps fee.
    let quote = quote_swap(
      &POOL,
      SwapDirection::SolToToken,
      1_000_000_000,
      100,
    )
    .unwrap();
    // after_fee = 997_000_000 lamports
    // out = 1e12 * 997e6 / (10e9 + 997e6) = 90_661_089_388 raw
    assert!(quote.expected_output >= 90_661_089_380);
    assert!(quote.expected_output <= 90_661_089_395);
    // Strictly below the zero-impact spot price of 99_700 tokens.
    assert!(quote.expected_output < 99_700_000_000);
    assert!(quote.minimum_output < quote.expected_output);
  }

  #[test]
  fn token_to_sol_mirrors_reserves() {
    let quote =
      quote_swap(&POOL, SwapDirection::TokenToSol, 100_000_000_000, 50)
        .unwrap();
    // 100k tokens against a 1M token reserve moves ~1/11th of the pool.
    let after_fee = deduct_fee(100_000_000_000, 30).unwrap();
    let expected =
      constant_product_out(POOL.token_reserve, POOL.sol_reserve, after_fee)
        .unwrap();
    assert_eq!(quote.expected_output, expected);
  }

  #[test]
  fn empty_pool_reports_no_liquidity() {
    let drained = PoolReserves {
      token_reserve: 0,
      sol_reserve: 10,
      fee_rate_bps: 0,
    };
    let err =
      quote_swap(&drained, SwapDirection::SolToToken, 1_000, 0).unwrap_err();
    assert_eq!(err, CoreError::NoLiquidity);
  }

  #[test]
  fn excessive_fee_rate_rejected() {
    let bad = PoolReserves {
      fee_rate_bps: 1_001,
      ..POOL
    };
    let err =
      quote_swap(&bad, SwapDirection::SolToToken, 1_000, 0).unwrap_err();
    assert_eq!(err, CoreError::InvalidFeeRate(1_001));
  }

  #[test]
  fn price_impact_is_capped_for_display() {
    let quote = quote_swap(
      &POOL,
      SwapDirection::SolToToken,
      100_000_000_000, // 10x the SOL reserve
      100,
    )
    .unwrap();
    assert!((quote.price_impact_pct - PRICE_IMPACT_CAP_PCT).abs() < f64::EPSILON);
  }

  proptest! {
    #[test]
    fn fee_never_exceeds_input(amount in 0u64..u64::MAX / 2, fee in 0u16..=1_000) {
      let after = deduct_fee(amount, fee).unwrap();
      prop_assert!(after <= amount);
      if fee == 0 {
        prop_assert_eq!(after, amount);
      }
    }

    #[test]
    fn minimum_never_exceeds_expected(expected in 0u64..u64::MAX / 2, slip in 0u64..10_000) {
      let min = minimum_output(expected, slip).unwrap();
      prop_assert!(min <= expected);
    }

    #[test]
    fn output_monotone_in_input(
      input in 1_000u64..1_000_000_000,
      slip in 0u64..500,
    ) {
      let smaller =
        quote_swap(&POOL, SwapDirection::SolToToken, input, slip).unwrap();
      let larger =
        quote_swap(&POOL, SwapDirection::SolToToken, input * 2, slip).unwrap();
      prop_assert!(larger.expected_output > smaller.expected_output);
      prop_assert!(larger.price_impact_pct >= smaller.price_impact_pct);
    }

    #[test]
    fn output_never_drains_reserve(input in 1u64..u64::MAX / 2) {
      if let Ok(quote) =
        quote_swap(&POOL, SwapDirection::SolToToken, input, 0)
      {
        prop_assert!(quote.expected_output < POOL.token_reserve);
      }
    }
  }
}
