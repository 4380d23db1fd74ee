//! LP share math for pool deposits and withdrawals.

use crate::error::CoreError;

/// LP tokens minted for a deposit against current reserves.
///
/// The pool prices the deposit on both sides and mints the smaller share,
/// so an unbalanced deposit donates the excess to the pool rather than
/// extracting value from it.
///
/// # Errors
/// - [`CoreError::NoLiquidity`] when reserves or supply are empty
/// - [`CoreError::ZeroAmount`] on an empty deposit
pub fn lp_tokens_out(
  token_in: u64,
  sol_in: u64,
  token_reserve: u64,
  sol_reserve: u64,
  lp_supply: u64,
) -> Result<u64, CoreError> {
  if token_in == 0 || sol_in == 0 {
    return Err(CoreError::ZeroAmount);
  }
  if token_reserve == 0 || sol_reserve == 0 || lp_supply == 0 {
    return Err(CoreError::NoLiquidity);
  }
  let from_token =
    u128::from(token_in) * u128::from(lp_supply) / u128::from(token_reserve);
  let from_sol =
    u128::from(sol_in) * u128::from(lp_supply) / u128::from(sol_reserve);
  u64::try_from(from_token.min(from_sol))
    .map_err(|_| CoreError::AmountOverflow)
}

/// Reserve amounts released when burning `lp_in` LP tokens.
///
/// # Errors
/// - [`CoreError::NoLiquidity`] when the pool is empty
/// - [`CoreError::ZeroAmount`] on a zero burn
pub fn withdrawal_amounts(
  lp_in: u64,
  token_reserve: u64,
  sol_reserve: u64,
  lp_supply: u64,
) -> Result<(u64, u64), CoreError> {
  if lp_in == 0 {
    return Err(CoreError::ZeroAmount);
  }
  if lp_supply == 0 {
    return Err(CoreError::NoLiquidity);
  }
  let token_out =
    u128::from(token_reserve) * u128::from(lp_in) / u128::from(lp_supply);
  let sol_out =
    u128::from(sol_reserve) * u128::from(lp_in) / u128::from(lp_supply);
  let token_out =
    u64::try_from(token_out).map_err(|_| CoreError::AmountOverflow)?;
  let sol_out = u64::try_from(sol_out).map_err(|_| CoreError::AmountOverflow)?;
  Ok((token_out, sol_out))
}
