use thiserror::Error;

/// Custom error codes emitted by the AMM program. Anchor numbers custom
/// errors from 6000.
pub mod program_code {
  pub const INVALID_FEE_RATE: u32 = 6000;
  pub const POOL_NOT_FOUND: u32 = 6001;
  pub const SLIPPAGE_EXCEEDED: u32 = 6002;
  pub const INSUFFICIENT_LIQUIDITY: u32 = 6003;
}

/// Client-side failures decoding the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdlError {
  #[error("malformed token identity: {0}")]
  InvalidIdentity(String),
  #[error("account data shorter than the discriminator")]
  AccountTooShort,
  #[error("account discriminator does not match a pool account")]
  DiscriminatorMismatch,
  #[error("pool account body failed to deserialize")]
  MalformedAccount,
}
