use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
  #[error("pool has no liquidity on one or both sides")]
  NoLiquidity,
  #[error("fee rate {0} bps exceeds the accepted maximum")]
  InvalidFeeRate(u16),
  #[error("slippage tolerance {0} bps is not below 10000")]
  InvalidSlippage(u64),
  #[error("arithmetic overflow in quote computation")]
  AmountOverflow,
  #[error("input amount must be greater than zero")]
  ZeroAmount,
  #[error("malformed amount string: {0}")]
  InvalidAmount(String),
  #[error("amount has more than {0} decimal places")]
  TooManyDecimals(u8),
}
