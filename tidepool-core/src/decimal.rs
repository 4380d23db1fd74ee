//! Raw-unit ↔ display conversion.
//!
//! All interior math runs on raw `u64` amounts; user-entered decimal
//! strings are parsed here with pure integer arithmetic so display
//! conversion can never drift from the on-chain representation.

use crate::error::CoreError;

/// Parses a user-entered decimal string into raw smallest units.
///
/// Accepts `"12"`, `"12.5"`, `".5"`; rejects sign characters, exponents,
/// empty strings, and more fractional digits than the mint carries.
///
/// # Errors
/// - [`CoreError::InvalidAmount`] on malformed input
/// - [`CoreError::TooManyDecimals`] when precision exceeds the mint's
/// - [`CoreError::AmountOverflow`] when the raw value exceeds `u64`
pub fn parse_amount(input: &str, decimals: u8) -> Result<u64, CoreError> {
  let trimmed = input.trim();
  if trimmed.is_empty() || trimmed == "." {
    return Err(CoreError::InvalidAmount(input.to_string()));
  }
  let (whole, frac) = match trimmed.split_once('.') {
    Some((w, f)) => (w, f),
    None => (trimmed, ""),
  };
  if !whole.chars().all(|c| c.is_ascii_digit())
    || !frac.chars().all(|c| c.is_ascii_digit())
  {
    return Err(CoreError::InvalidAmount(input.to_string()));
  }
  if frac.len() > usize::from(decimals) {
    return Err(CoreError::TooManyDecimals(decimals));
  }
  let whole_part: u128 = if whole.is_empty() {
    0
  } else {
    whole
      .parse()
      .map_err(|_| CoreError::InvalidAmount(input.to_string()))?
  };
  let frac_part: u128 = if frac.is_empty() {
    0
  } else {
    frac
      .parse()
      .map_err(|_| CoreError::InvalidAmount(input.to_string()))?
  };
  let scale = 10u128.pow(u32::from(decimals));
  let frac_scale = 10u128.pow(u32::from(decimals) - frac.len() as u32);
  let raw = whole_part
    .checked_mul(scale)
    .and_then(|w| w.checked_add(frac_part * frac_scale))
    .ok_or(CoreError::AmountOverflow)?;
  u64::try_from(raw).map_err(|_| CoreError::AmountOverflow)
}

/// Formats a raw amount for display, trimming trailing fractional zeros.
#[must_use]
pub fn format_amount(raw: u64, decimals: u8) -> String {
  if decimals == 0 {
    return raw.to_string();
  }
  let scale = 10u128.pow(u32::from(decimals));
  let whole = u128::from(raw) / scale;
  let frac = u128::from(raw) % scale;
  if frac == 0 {
    return whole.to_string();
  }
  let frac = format!("{frac:0width$}", width = usize::from(decimals));
  format!("{whole}.{}", frac.trim_end_matches('0'))
}
