//! Instruction-list assembly for pool operations.
//!
//! Every transaction carries the same prelude: a compute-unit limit and a
//! priority-fee directive, then any associated-token-account the operation
//! needs but the ledger lacks, then the program instruction itself.

use std::sync::Arc;

use anchor_client::solana_sdk::compute_budget::ComputeBudgetInstruction;
use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_spl::associated_token::spl_associated_token_account;
use log::{debug, warn};
use tidepool_idl::instructions::{
  add_liquidity, initialize_pool, remove_liquidity, swap_sol_for_tokens,
  swap_tokens_for_sol, AddLiquidity, InitializePool, RemoveLiquidity,
  SwapSolForTokens, SwapTokensForSol,
};
use tidepool_idl::pda;

use crate::rpc::LedgerRpc;
use crate::token_directory::TokenDirectory;
use crate::translate::SwapFailure;

pub const COMPUTE_UNIT_LIMIT: u32 = 250_000;
pub const COMPUTE_UNIT_PRICE_MICRO_LAMPORTS: u64 = 100_000;
/// Assumed when the token directory has no listing for a mint.
pub const DEFAULT_TOKEN_DECIMALS: u8 = 9;

/// A pool operation with all amounts already in raw base units.
#[derive(Debug, Clone, Copy)]
pub enum PoolOperation {
  InitializePool {
    fee_rate_bps: u16,
    token_amount: u64,
    sol_amount: u64,
  },
  AddLiquidity {
    token_amount: u64,
    sol_amount: u64,
    minimum_lp_out: u64,
  },
  RemoveLiquidity {
    lp_amount: u64,
    minimum_token_out: u64,
    minimum_sol_out: u64,
  },
  SwapSolForTokens {
    amount_in: u64,
    minimum_out: u64,
  },
  SwapTokensForSol {
    amount_in: u64,
    minimum_out: u64,
  },
}

impl PoolOperation {
  /// The mint whose associated token account receives this operation's
  /// output and may not exist yet, if any. A removal pays out into the
  /// token ATA (the LP ATA necessarily exists, the user holds LP tokens);
  /// a token-to-SOL swap pays out in lamports and needs none.
  fn required_ata_mint(&self, token_mint: Pubkey) -> Option<Pubkey> {
    match self {
      PoolOperation::SwapSolForTokens { .. }
      | PoolOperation::RemoveLiquidity { .. } => Some(token_mint),
      PoolOperation::InitializePool { .. }
      | PoolOperation::AddLiquidity { .. } => Some(pda::lp_mint(token_mint)),
      PoolOperation::SwapTokensForSol { .. } => None,
    }
  }

  fn program_instruction(&self, user: Pubkey, token_mint: Pubkey) -> Instruction {
    match *self {
      PoolOperation::InitializePool {
        fee_rate_bps,
        token_amount,
        sol_amount,
      } => initialize_pool(
        user,
        token_mint,
        &InitializePool {
          fee_rate_bps,
          token_amount,
          sol_amount,
        },
      ),
      PoolOperation::AddLiquidity {
        token_amount,
        sol_amount,
        minimum_lp_out,
      } => add_liquidity(
        user,
        token_mint,
        &AddLiquidity {
          token_amount,
          sol_amount,
          minimum_lp_out,
        },
      ),
      PoolOperation::RemoveLiquidity {
        lp_amount,
        minimum_token_out,
        minimum_sol_out,
      } => remove_liquidity(
        user,
        token_mint,
        &RemoveLiquidity {
          lp_amount,
          minimum_token_out,
          minimum_sol_out,
        },
      ),
      PoolOperation::SwapSolForTokens {
        amount_in,
        minimum_out,
      } => swap_sol_for_tokens(
        user,
        token_mint,
        &SwapSolForTokens {
          amount_in,
          minimum_out,
        },
      ),
      PoolOperation::SwapTokensForSol {
        amount_in,
        minimum_out,
      } => swap_tokens_for_sol(
        user,
        token_mint,
        &SwapTokensForSol {
          amount_in,
          minimum_out,
        },
      ),
    }
  }
}

pub struct TransactionAssembler<R> {
  rpc: Arc<R>,
  directory: Arc<dyn TokenDirectory>,
}

impl<R: LedgerRpc> TransactionAssembler<R> {
  pub fn new(rpc: Arc<R>, directory: Arc<dyn TokenDirectory>) -> Self {
    Self { rpc, directory }
  }

  /// Decimals for a mint, and whether the answer is the assumed default
  /// rather than a directory listing. Directory failures degrade to the
  /// default; they never block assembly.
  pub async fn resolve_token_decimals(&self, mint: &Pubkey) -> (u8, bool) {
    match self.directory.lookup(mint).await {
      Ok(Some(metadata)) => (metadata.decimals, false),
      Ok(None) => (DEFAULT_TOKEN_DECIMALS, true),
      Err(err) => {
        warn!("token directory lookup failed for {mint}: {err:#}");
        (DEFAULT_TOKEN_DECIMALS, true)
      }
    }
  }

  /// Builds the ordered instruction list for one operation.
  ///
  /// # Errors
  /// Fails only on transport errors while probing for the destination
  /// token account.
  pub async fn assemble(
    &self,
    user: Pubkey,
    token_mint: Pubkey,
    operation: &PoolOperation,
  ) -> Result<Vec<Instruction>, SwapFailure> {
    let mut instructions = vec![
      ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT),
      ComputeBudgetInstruction::set_compute_unit_price(
        COMPUTE_UNIT_PRICE_MICRO_LAMPORTS,
      ),
    ];
    if let Some(mint) = operation.required_ata_mint(token_mint) {
      let destination = pda::ata(user, mint);
      let exists = self
        .rpc
        .account_exists(&destination)
        .await
        .map_err(|err| SwapFailure::from_rpc(&err))?;
      if !exists {
        debug!("creating associated token account {destination} for {mint}");
        instructions.push(
          spl_associated_token_account::instruction::create_associated_token_account_idempotent(
            &user,
            &user,
            &mint,
            &anchor_spl::token::ID,
          ),
        );
      }
    }
    instructions.push(operation.program_instruction(user, token_mint));
    Ok(instructions)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use anchor_client::solana_sdk::account::Account;
  use anchor_client::solana_sdk::hash::Hash;
  use anchor_client::solana_sdk::signature::Signature;
  use anchor_client::solana_sdk::transaction::{
    TransactionError, VersionedTransaction,
  };
  use async_trait::async_trait;
  use tidepool_idl::amm;

  use super::*;
  use crate::rpc::RpcError;
  use crate::token_directory::StaticTokenDirectory;

  struct FixedRpc {
    existing: Vec<Pubkey>,
  }

  #[async_trait]
  impl LedgerRpc for FixedRpc {
    async fn get_account(
      &self,
      address: &Pubkey,
    ) -> Result<Option<Account>, RpcError> {
      Ok(self.existing.contains(address).then(Account::default))
    }

    async fn get_balance(&self, _address: &Pubkey) -> Result<u64, RpcError> {
      Ok(0)
    }

    async fn get_token_balance(
      &self,
      _token_account: &Pubkey,
    ) -> Result<Option<u64>, RpcError> {
      Ok(None)
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
      Ok(Hash::default())
    }

    async fn send_transaction(
      &self,
      _transaction: &VersionedTransaction,
      _skip_preflight: bool,
    ) -> Result<Signature, RpcError> {
      Ok(Signature::default())
    }

    async fn signature_status(
      &self,
      _signature: &Signature,
    ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
      Ok(None)
    }
  }

  fn assembler(existing: Vec<Pubkey>) -> TransactionAssembler<FixedRpc> {
    TransactionAssembler::new(
      Arc::new(FixedRpc { existing }),
      Arc::new(StaticTokenDirectory::new(HashMap::new())),
    )
  }

  #[tokio::test]
  async fn swap_into_missing_ata_prepends_creation() {
    let user = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let instructions = assembler(vec![])
      .assemble(
        user,
        mint,
        &PoolOperation::SwapSolForTokens {
          amount_in: 1,
          minimum_out: 1,
        },
      )
      .await
      .unwrap();
    assert_eq!(instructions.len(), 4);
    assert_eq!(
      instructions[2].program_id,
      spl_associated_token_account::ID
    );
    assert_eq!(instructions[3].program_id, amm::ID);
  }

  #[tokio::test]
  async fn existing_ata_is_not_recreated() {
    let user = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let instructions = assembler(vec![pda::ata(user, mint)])
      .assemble(
        user,
        mint,
        &PoolOperation::SwapSolForTokens {
          amount_in: 1,
          minimum_out: 1,
        },
      )
      .await
      .unwrap();
    assert_eq!(instructions.len(), 3);
    assert_eq!(instructions[2].program_id, amm::ID);
  }

  #[tokio::test]
  async fn remove_liquidity_into_missing_token_ata_prepends_creation() {
    let user = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let instructions = assembler(vec![])
      .assemble(
        user,
        mint,
        &PoolOperation::RemoveLiquidity {
          lp_amount: 1,
          minimum_token_out: 1,
          minimum_sol_out: 1,
        },
      )
      .await
      .unwrap();
    assert_eq!(instructions.len(), 4);
    assert_eq!(
      instructions[2].program_id,
      spl_associated_token_account::ID
    );
    assert!(instructions[2]
      .accounts
      .iter()
      .any(|meta| meta.pubkey == pda::ata(user, mint)));
    assert_eq!(instructions[3].program_id, amm::ID);
  }

  #[tokio::test]
  async fn token_to_sol_swap_needs_no_ata_probe() {
    let user = Pubkey::new_unique();
    let mint = Pubkey::new_unique();
    let instructions = assembler(vec![])
      .assemble(
        user,
        mint,
        &PoolOperation::SwapTokensForSol {
          amount_in: 1,
          minimum_out: 1,
        },
      )
      .await
      .unwrap();
    assert_eq!(instructions.len(), 3);
  }

  #[tokio::test]
  async fn unlisted_mint_falls_back_to_default_decimals() {
    let mint = Pubkey::new_unique();
    let (decimals, assumed) =
      assembler(vec![]).resolve_token_decimals(&mint).await;
    assert_eq!(decimals, DEFAULT_TOKEN_DECIMALS);
    assert!(assumed);
  }
}
