//! Instruction builders for the AMM program.
//!
//! Argument structs serialize with Anchor's wire format: the 8-byte
//! `sha256("global:<name>")` discriminator followed by borsh-encoded
//! fields. Account orders are part of the program contract and must not
//! be reordered.

use anchor_lang::prelude::{borsh, Pubkey};
use anchor_lang::solana_program::instruction::{AccountMeta, Instruction};
use anchor_lang::{
  system_program, AnchorSerialize, Discriminator, InstructionData,
};
use anchor_spl::token;

use crate::{amm, pda};

macro_rules! instruction_args {
  ($name:ident { $($field:ident: $ty:ty),* $(,)? }, $disc:expr) => {
    #[derive(Debug, Clone, Copy, AnchorSerialize)]
    pub struct $name {
      $(pub $field: $ty,)*
    }

    impl Discriminator for $name {
      const DISCRIMINATOR: &'static [u8] = &$disc;
    }

    impl InstructionData for $name {}
  };
}

instruction_args!(
  InitializePool {
    fee_rate_bps: u16,
    token_amount: u64,
    sol_amount: u64,
  },
  [0x5f, 0xb4, 0x0a, 0xac, 0x54, 0xae, 0xe8, 0x28]
);

instruction_args!(
  AddLiquidity {
    token_amount: u64,
    sol_amount: u64,
    minimum_lp_out: u64,
  },
  [0xb5, 0x9d, 0x59, 0x43, 0x8f, 0xb6, 0x34, 0x48]
);

instruction_args!(
  RemoveLiquidity {
    lp_amount: u64,
    minimum_token_out: u64,
    minimum_sol_out: u64,
  },
  [0x50, 0x55, 0xd1, 0x48, 0x18, 0xce, 0xb1, 0x6c]
);

instruction_args!(
  SwapSolForTokens {
    amount_in: u64,
    minimum_out: u64,
  },
  [0x01, 0xab, 0x18, 0x87, 0xc9, 0xec, 0xd2, 0xdb]
);

instruction_args!(
  SwapTokensForSol {
    amount_in: u64,
    minimum_out: u64,
  },
  [0xbc, 0x74, 0x6c, 0x17, 0x44, 0x21, 0xcc, 0xdc]
);

fn swap_account_metas(user: Pubkey, token_mint: Pubkey) -> Vec<AccountMeta> {
  let addrs = pda::PoolAddresses::derive(token_mint);
  vec![
    AccountMeta::new(user, true),
    AccountMeta::new(addrs.pool, false),
    AccountMeta::new_readonly(addrs.pool_authority, false),
    AccountMeta::new(addrs.token_vault, false),
    AccountMeta::new(addrs.sol_vault, false),
    AccountMeta::new(pda::ata(user, token_mint), false),
    AccountMeta::new_readonly(token_mint, false),
    AccountMeta::new_readonly(token::ID, false),
    AccountMeta::new_readonly(system_program::ID, false),
  ]
}

fn liquidity_account_metas(
  user: Pubkey,
  token_mint: Pubkey,
) -> Vec<AccountMeta> {
  let addrs = pda::PoolAddresses::derive(token_mint);
  vec![
    AccountMeta::new(user, true),
    AccountMeta::new(addrs.pool, false),
    AccountMeta::new_readonly(addrs.pool_authority, false),
    AccountMeta::new(addrs.token_vault, false),
    AccountMeta::new(addrs.sol_vault, false),
    AccountMeta::new(addrs.lp_mint, false),
    AccountMeta::new(pda::ata(user, token_mint), false),
    AccountMeta::new(pda::ata(user, addrs.lp_mint), false),
    AccountMeta::new_readonly(token_mint, false),
    AccountMeta::new_readonly(token::ID, false),
    AccountMeta::new_readonly(system_program::ID, false),
  ]
}

#[must_use]
pub fn initialize_pool(
  user: Pubkey,
  token_mint: Pubkey,
  args: &InitializePool,
) -> Instruction {
  Instruction {
    program_id: amm::ID,
    accounts: liquidity_account_metas(user, token_mint),
    data: args.data(),
  }
}

#[must_use]
pub fn add_liquidity(
  user: Pubkey,
  token_mint: Pubkey,
  args: &AddLiquidity,
) -> Instruction {
  Instruction {
    program_id: amm::ID,
    accounts: liquidity_account_metas(user, token_mint),
    data: args.data(),
  }
}

#[must_use]
pub fn remove_liquidity(
  user: Pubkey,
  token_mint: Pubkey,
  args: &RemoveLiquidity,
) -> Instruction {
  Instruction {
    program_id: amm::ID,
    accounts: liquidity_account_metas(user, token_mint),
    data: args.data(),
  }
}

#[must_use]
pub fn swap_sol_for_tokens(
  user: Pubkey,
  token_mint: Pubkey,
  args: &SwapSolForTokens,
) -> Instruction {
  Instruction {
    program_id: amm::ID,
    accounts: swap_account_metas(user, token_mint),
    data: args.data(),
  }
}

#[must_use]
pub fn swap_tokens_for_sol(
  user: Pubkey,
  token_mint: Pubkey,
  args: &SwapTokensForSol,
) -> Instruction {
  Instruction {
    program_id: amm::ID,
    accounts: swap_account_metas(user, token_mint),
    data: args.data(),
  }
}
