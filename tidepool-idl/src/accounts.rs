//! On-chain account layouts.

use anchor_lang::prelude::{borsh, Pubkey};
use anchor_lang::AnchorDeserialize;

use crate::error::IdlError;

/// Pool account body as stored on chain, after the 8-byte discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AnchorDeserialize)]
pub struct Pool {
  pub token_mint: Pubkey,
  pub token_reserve: u64,
  pub sol_reserve: u64,
  pub lp_supply: u64,
  pub fee_rate_bps: u16,
  pub bump: u8,
}

impl Pool {
  /// `sha256("account:Pool")[..8]`
  pub const DISCRIMINATOR: [u8; 8] =
    [0xf1, 0x9a, 0x6d, 0x04, 0x11, 0xb1, 0x6d, 0xbc];

  /// Deserializes a fetched account, checking the discriminator first so
  /// an arbitrary account at the derived address is rejected rather than
  /// misread.
  ///
  /// # Errors
  /// - [`IdlError::AccountTooShort`]
  /// - [`IdlError::DiscriminatorMismatch`]
  /// - [`IdlError::MalformedAccount`]
  pub fn try_deserialize(data: &[u8]) -> Result<Pool, IdlError> {
    let Some((discriminator, body)) = data.split_at_checked(8) else {
      return Err(IdlError::AccountTooShort);
    };
    if discriminator != Self::DISCRIMINATOR.as_slice() {
      return Err(IdlError::DiscriminatorMismatch);
    }
    Pool::deserialize(&mut &body[..]).map_err(|_| IdlError::MalformedAccount)
  }
}
