//! Deterministic pool sub-account derivation.
//!
//! All five sub-accounts hang off the token mint under [`crate::amm::ID`].
//! Derivation is pure and infallible for a well-formed mint; the only
//! failure mode is a malformed identity string at the parse boundary.

use std::str::FromStr;

use anchor_lang::prelude::Pubkey;
use anchor_spl::associated_token::get_associated_token_address;

use crate::amm;
use crate::error::IdlError;

macro_rules! pda {
  ($base:expr, $key:expr) => {
    Pubkey::find_program_address(&[$base, $key.as_ref()], &amm::ID).0
  };
}

/// Parses a base58 token identity string.
///
/// # Errors
/// [`IdlError::InvalidIdentity`] when the string is not a valid address.
pub fn parse_token_identity(raw: &str) -> Result<Pubkey, IdlError> {
  Pubkey::from_str(raw.trim())
    .map_err(|_| IdlError::InvalidIdentity(raw.to_string()))
}

#[must_use]
pub fn pool(token_mint: Pubkey) -> Pubkey {
  pda!(amm::constants::POOL, token_mint)
}

#[must_use]
pub fn pool_authority(token_mint: Pubkey) -> Pubkey {
  pda!(amm::constants::POOL_AUTHORITY, token_mint)
}

#[must_use]
pub fn token_vault(token_mint: Pubkey) -> Pubkey {
  pda!(amm::constants::TOKEN_VAULT, token_mint)
}

#[must_use]
pub fn sol_vault(token_mint: Pubkey) -> Pubkey {
  pda!(amm::constants::SOL_VAULT, token_mint)
}

#[must_use]
pub fn lp_mint(token_mint: Pubkey) -> Pubkey {
  pda!(amm::constants::LP_MINT, token_mint)
}

#[must_use]
pub fn ata(auth: Pubkey, mint: Pubkey) -> Pubkey {
  get_associated_token_address(&auth, &mint)
}

/// The full set of sub-accounts a pool operation touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAddresses {
  pub pool: Pubkey,
  pub pool_authority: Pubkey,
  pub token_vault: Pubkey,
  pub sol_vault: Pubkey,
  pub lp_mint: Pubkey,
}

impl PoolAddresses {
  #[must_use]
  pub fn derive(token_mint: Pubkey) -> Self {
    Self {
      pool: pool(token_mint),
      pool_authority: pool_authority(token_mint),
      token_vault: token_vault(token_mint),
      sol_vault: sol_vault(token_mint),
      lp_mint: lp_mint(token_mint),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derivation_is_deterministic() {
    let mint = Pubkey::new_unique();
    assert_eq!(PoolAddresses::derive(mint), PoolAddresses::derive(mint));
  }

  #[test]
  fn seeds_yield_distinct_addresses() {
    let mint = Pubkey::new_unique();
    let addrs = PoolAddresses::derive(mint);
    let all = [
      addrs.pool,
      addrs.pool_authority,
      addrs.token_vault,
      addrs.sol_vault,
      addrs.lp_mint,
    ];
    for (i, a) in all.iter().enumerate() {
      for b in &all[i + 1..] {
        assert_ne!(a, b);
      }
    }
  }

  #[test]
  fn distinct_mints_never_collide() {
    let a = PoolAddresses::derive(Pubkey::new_unique());
    let b = PoolAddresses::derive(Pubkey::new_unique());
    assert_ne!(a.pool, b.pool);
    assert_ne!(a.token_vault, b.token_vault);
  }

  #[test]
  fn wrong_program_id_derives_different_addresses() {
    // The silent-footgun case: a mismatched program ID still produces a
    // well-formed address, just not the pool's.
    let mint = Pubkey::new_unique();
    let other_program = Pubkey::new_unique();
    let wrong = Pubkey::find_program_address(
      &[amm::constants::POOL, mint.as_ref()],
      &other_program,
    )
    .0;
    assert_ne!(pool(mint), wrong);
  }

  #[test]
  fn identity_parsing_round_trips() {
    let mint = Pubkey::new_unique();
    assert_eq!(parse_token_identity(&mint.to_string()).unwrap(), mint);
    assert!(matches!(
      parse_token_identity("not-base58!"),
      Err(IdlError::InvalidIdentity(_))
    ));
  }
}
