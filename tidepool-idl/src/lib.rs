//! Wire contract for the Tidepool AMM program.
//!
//! The on-chain program is a black box to this SDK; everything here pins
//! the bits the client must reproduce exactly: the program ID, PDA seeds,
//! the `Pool` account layout, instruction discriminators and account
//! orders, and the program's custom error codes.

pub mod accounts;
pub mod error;
pub mod instructions;
pub mod pda;

pub mod amm {
  use anchor_lang::prelude::{pubkey, Pubkey};

  /// The deployed AMM program. Every derivation and instruction in this
  /// crate must use this one constant; deriving against any other ID
  /// yields well-formed but wrong addresses.
  pub const ID: Pubkey = pubkey!("Ed5i4GsQCTU5NLvgieHUWHFAGfBJ61NfktWw271fesEJ");

  pub mod constants {
    pub const POOL: &[u8] = b"pool";
    pub const POOL_AUTHORITY: &[u8] = b"pool_authority";
    pub const TOKEN_VAULT: &[u8] = b"token_vault";
    pub const SOL_VAULT: &[u8] = b"sol_vault";
    pub const LP_MINT: &[u8] = b"lp_mint";
  }
}
