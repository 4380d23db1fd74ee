//! High-level swap and liquidity surface.
//!
//! Ties the whole stack together: cached pool snapshots feed quotes,
//! quotes feed instruction assembly, assembly feeds the submission
//! pipeline, and the outcome carries a measured received amount rather
//! than a quoted one.

use std::sync::Arc;

use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Signature;
use log::{info, warn};
use tidepool_core::liquidity::{lp_tokens_out, withdrawal_amounts};
use tidepool_core::swap::minimum_output;
use tidepool_core::{
  parse_amount, quote_swap, SwapDirection, SwapQuote, MAX_FEE_RATE_BPS,
};
use tidepool_idl::pda;

use crate::assembler::{PoolOperation, TransactionAssembler};
use crate::pipeline::SubmissionPipeline;
use crate::pool_state::{PoolState, PoolStateCache};
use crate::rpc::LedgerRpc;
use crate::token_directory::TokenDirectory;
use crate::translate::{ErrorCategory, SwapFailure};
use crate::wallet::{normalize_provider, InjectedRegistry, ProviderSource};

pub const SOL_DECIMALS: u8 = 9;
/// Lamports kept aside for fees when spending native balance.
pub const FEE_BUFFER_LAMPORTS: u64 = 10_000_000;

/// Quote plus the decimal context it was computed under.
#[derive(Debug, Clone, Copy)]
pub struct ClientQuote {
  pub quote: SwapQuote,
  pub token_decimals: u8,
  /// True when the token directory had no listing and default decimals
  /// were assumed; the UI should flag the figures as approximate.
  pub assumed_default_decimals: bool,
}

/// Terminal result of one submission, success or not.
#[derive(Debug, Clone)]
pub struct SwapOutcome {
  pub success: bool,
  pub signature: Option<Signature>,
  /// Measured balance delta, not the quote. `None` when the post-balance
  /// read failed on an otherwise confirmed transaction.
  pub amount_received: Option<u64>,
  pub failure: Option<SwapFailure>,
}

impl SwapOutcome {
  fn failed(failure: SwapFailure) -> Self {
    Self {
      success: false,
      signature: None,
      amount_received: None,
      failure: Some(failure),
    }
  }
}

pub struct SwapClient<R> {
  rpc: Arc<R>,
  cache: PoolStateCache<R>,
  assembler: TransactionAssembler<R>,
  pipeline: SubmissionPipeline<R>,
  injected: InjectedRegistry,
}

impl<R: LedgerRpc> SwapClient<R> {
  pub fn new(
    rpc: Arc<R>,
    directory: Arc<dyn TokenDirectory>,
    injected: InjectedRegistry,
  ) -> Self {
    Self {
      cache: PoolStateCache::new(rpc.clone()),
      assembler: TransactionAssembler::new(rpc.clone(), directory),
      pipeline: SubmissionPipeline::new(rpc.clone()),
      rpc,
      injected,
    }
  }

  /// Pool snapshot for a mint, served from cache within its TTL.
  ///
  /// # Errors
  /// See [`PoolStateCache::get`]; `Ok(None)` means no pool exists.
  pub async fn get_pool_state(
    &self,
    token_mint: Pubkey,
    force_refresh: bool,
  ) -> Result<Option<PoolState>, SwapFailure> {
    if force_refresh {
      self.cache.invalidate(token_mint);
    }
    self
      .cache
      .get(token_mint)
      .await
      .map_err(|err| SwapFailure::from_pool_fetch(&err))
  }

  /// Quotes a swap from a decimal input string.
  ///
  /// # Errors
  /// - [`ErrorCategory::PoolNotFound`] when no pool exists for the mint
  /// - [`ErrorCategory::InvalidInput`] on a malformed amount or slippage
  /// - [`ErrorCategory::InsufficientLiquidity`] on an empty pool side
  pub async fn get_quote(
    &self,
    token_mint: Pubkey,
    input: &str,
    direction: SwapDirection,
    slippage_bps: u64,
  ) -> Result<ClientQuote, SwapFailure> {
    let Some(pool) = self.get_pool_state(token_mint, false).await? else {
      return Err(SwapFailure::new(
        ErrorCategory::PoolNotFound,
        format!("no pool for {token_mint}"),
      ));
    };
    let (token_decimals, assumed_default_decimals) =
      self.assembler.resolve_token_decimals(&token_mint).await;
    let input_decimals = match direction {
      SwapDirection::SolToToken => SOL_DECIMALS,
      SwapDirection::TokenToSol => token_decimals,
    };
    let input_amount = parse_amount(input, input_decimals)
      .map_err(|err| SwapFailure::from_core(&err))?;
    let quote = quote_swap(&pool.reserves, direction, input_amount, slippage_bps)
      .map_err(|err| SwapFailure::from_core(&err))?;
    Ok(ClientQuote {
      quote,
      token_decimals,
      assumed_default_decimals,
    })
  }

  /// Executes a swap end to end and reports a terminal outcome. Never
  /// panics and never returns `Err`; every failure lands in the outcome.
  pub async fn execute_swap(
    &self,
    token_mint: Pubkey,
    input: &str,
    minimum_output: u64,
    direction: SwapDirection,
    provider: ProviderSource,
  ) -> SwapOutcome {
    let wallet = normalize_provider(provider, &self.injected);
    let Some(user) = wallet.address else {
      return SwapOutcome::failed(SwapFailure::new(
        ErrorCategory::WalletUnavailable,
        "no wallet connected",
      ));
    };
    if wallet.is_read_only() {
      return SwapOutcome::failed(SwapFailure::new(
        ErrorCategory::WalletUnavailable,
        "connected wallet cannot sign",
      ));
    }

    let pool = match self.get_pool_state(token_mint, false).await {
      Ok(Some(pool)) => pool,
      Ok(None) => {
        return SwapOutcome::failed(SwapFailure::new(
          ErrorCategory::PoolNotFound,
          format!("no pool for {token_mint}"),
        ));
      }
      Err(failure) => return SwapOutcome::failed(failure),
    };

    let (token_decimals, _) =
      self.assembler.resolve_token_decimals(&token_mint).await;
    let input_decimals = match direction {
      SwapDirection::SolToToken => SOL_DECIMALS,
      SwapDirection::TokenToSol => token_decimals,
    };
    let amount_in = match parse_amount(input, input_decimals) {
      Ok(amount) => amount,
      Err(err) => return SwapOutcome::failed(SwapFailure::from_core(&err)),
    };

    if let Err(failure) = self
      .check_balance(&user, token_mint, direction, amount_in)
      .await
    {
      return SwapOutcome::failed(failure);
    }

    let operation = match direction {
      SwapDirection::SolToToken => PoolOperation::SwapSolForTokens {
        amount_in,
        minimum_out: minimum_output,
      },
      SwapDirection::TokenToSol => PoolOperation::SwapTokensForSol {
        amount_in,
        minimum_out: minimum_output,
      },
    };
    let instructions =
      match self.assembler.assemble(user, token_mint, &operation).await {
        Ok(instructions) => instructions,
        Err(failure) => return SwapOutcome::failed(failure),
      };

    let balance_before = self.receive_balance(&user, token_mint, direction).await;

    let signature = match self
      .pipeline
      .submit(&instructions, user, &wallet)
      .await
    {
      Ok(signature) => signature,
      Err(failure) => return SwapOutcome::failed(failure),
    };
    // Reserves moved; the cached snapshot is stale regardless of outcome
    // details.
    self.cache.invalidate(pool.token_mint);
    info!("swap confirmed: {signature}");

    let amount_received = match (
      balance_before,
      self.receive_balance(&user, token_mint, direction).await,
    ) {
      (Ok(before), Ok(after)) => Some(after.saturating_sub(before)),
      (before, after) => {
        warn!(
          "could not measure received amount for {signature}: before={before:?} after={after:?}"
        );
        None
      }
    };

    SwapOutcome {
      success: true,
      signature: Some(signature),
      amount_received,
      failure: None,
    }
  }

  /// Creates a pool with initial reserves.
  ///
  /// # Errors
  /// Rejects out-of-range fee rates before anything is sent.
  pub async fn initialize_pool(
    &self,
    token_mint: Pubkey,
    fee_rate_bps: u16,
    token_amount: u64,
    sol_amount: u64,
    provider: ProviderSource,
  ) -> SwapOutcome {
    if fee_rate_bps > MAX_FEE_RATE_BPS {
      return SwapOutcome::failed(SwapFailure::new(
        ErrorCategory::InvalidPoolConfiguration,
        format!("fee rate {fee_rate_bps} bps exceeds {MAX_FEE_RATE_BPS}"),
      ));
    }
    self
      .liquidity_operation(
        token_mint,
        PoolOperation::InitializePool {
          fee_rate_bps,
          token_amount,
          sol_amount,
        },
        provider,
      )
      .await
  }

  /// Deposits both sides into an existing pool. The LP floor is derived
  /// from the current snapshot and the given tolerance.
  pub async fn add_liquidity(
    &self,
    token_mint: Pubkey,
    token_amount: u64,
    sol_amount: u64,
    slippage_bps: u64,
    provider: ProviderSource,
  ) -> SwapOutcome {
    let pool = match self.get_pool_state(token_mint, false).await {
      Ok(Some(pool)) => pool,
      Ok(None) => {
        return SwapOutcome::failed(SwapFailure::new(
          ErrorCategory::PoolNotFound,
          format!("no pool for {token_mint}"),
        ));
      }
      Err(failure) => return SwapOutcome::failed(failure),
    };
    let minimum_lp_out = match lp_tokens_out(
      token_amount,
      sol_amount,
      pool.reserves.token_reserve,
      pool.reserves.sol_reserve,
      pool.lp_supply,
    )
    .and_then(|expected| minimum_output(expected, slippage_bps))
    {
      Ok(minimum) => minimum,
      Err(err) => return SwapOutcome::failed(SwapFailure::from_core(&err)),
    };
    self
      .liquidity_operation(
        token_mint,
        PoolOperation::AddLiquidity {
          token_amount,
          sol_amount,
          minimum_lp_out,
        },
        provider,
      )
      .await
  }

  /// Burns LP tokens; floors on both released sides come from the current
  /// snapshot and the given tolerance.
  pub async fn remove_liquidity(
    &self,
    token_mint: Pubkey,
    lp_amount: u64,
    slippage_bps: u64,
    provider: ProviderSource,
  ) -> SwapOutcome {
    let pool = match self.get_pool_state(token_mint, false).await {
      Ok(Some(pool)) => pool,
      Ok(None) => {
        return SwapOutcome::failed(SwapFailure::new(
          ErrorCategory::PoolNotFound,
          format!("no pool for {token_mint}"),
        ));
      }
      Err(failure) => return SwapOutcome::failed(failure),
    };
    let floors = withdrawal_amounts(
      lp_amount,
      pool.reserves.token_reserve,
      pool.reserves.sol_reserve,
      pool.lp_supply,
    )
    .and_then(|(token_out, sol_out)| {
      Ok((
        minimum_output(token_out, slippage_bps)?,
        minimum_output(sol_out, slippage_bps)?,
      ))
    });
    let (minimum_token_out, minimum_sol_out) = match floors {
      Ok(floors) => floors,
      Err(err) => return SwapOutcome::failed(SwapFailure::from_core(&err)),
    };
    self
      .liquidity_operation(
        token_mint,
        PoolOperation::RemoveLiquidity {
          lp_amount,
          minimum_token_out,
          minimum_sol_out,
        },
        provider,
      )
      .await
  }

  async fn liquidity_operation(
    &self,
    token_mint: Pubkey,
    operation: PoolOperation,
    provider: ProviderSource,
  ) -> SwapOutcome {
    let wallet = normalize_provider(provider, &self.injected);
    let Some(user) = wallet.address else {
      return SwapOutcome::failed(SwapFailure::new(
        ErrorCategory::WalletUnavailable,
        "no wallet connected",
      ));
    };
    if wallet.is_read_only() {
      return SwapOutcome::failed(SwapFailure::new(
        ErrorCategory::WalletUnavailable,
        "connected wallet cannot sign",
      ));
    }
    let instructions =
      match self.assembler.assemble(user, token_mint, &operation).await {
        Ok(instructions) => instructions,
        Err(failure) => return SwapOutcome::failed(failure),
      };
    match self.pipeline.submit(&instructions, user, &wallet).await {
      Ok(signature) => {
        self.cache.invalidate(token_mint);
        SwapOutcome {
          success: true,
          signature: Some(signature),
          amount_received: None,
          failure: None,
        }
      }
      Err(failure) => SwapOutcome::failed(failure),
    }
  }

  /// Rejects a swap whose input side cannot cover the spend plus fees.
  async fn check_balance(
    &self,
    user: &Pubkey,
    token_mint: Pubkey,
    direction: SwapDirection,
    amount_in: u64,
  ) -> Result<(), SwapFailure> {
    match direction {
      SwapDirection::SolToToken => {
        let balance = self
          .rpc
          .get_balance(user)
          .await
          .map_err(|err| SwapFailure::from_rpc(&err))?;
        let required = amount_in.saturating_add(FEE_BUFFER_LAMPORTS);
        if balance < required {
          return Err(SwapFailure::new(
            ErrorCategory::InsufficientBalance,
            format!("balance {balance} lamports, need {required}"),
          ));
        }
      }
      SwapDirection::TokenToSol => {
        let ata = pda::ata(*user, token_mint);
        let balance = self
          .rpc
          .get_token_balance(&ata)
          .await
          .map_err(|err| SwapFailure::from_rpc(&err))?
          .unwrap_or(0);
        if balance < amount_in {
          return Err(SwapFailure::new(
            ErrorCategory::InsufficientBalance,
            format!("token balance {balance}, need {amount_in}"),
          ));
        }
      }
    }
    Ok(())
  }

  /// Balance on the receiving side of a swap, for delta measurement.
  async fn receive_balance(
    &self,
    user: &Pubkey,
    token_mint: Pubkey,
    direction: SwapDirection,
  ) -> Result<u64, SwapFailure> {
    match direction {
      SwapDirection::SolToToken => {
        let ata = pda::ata(*user, token_mint);
        Ok(
          self
            .rpc
            .get_token_balance(&ata)
            .await
            .map_err(|err| SwapFailure::from_rpc(&err))?
            .unwrap_or(0),
        )
      }
      SwapDirection::TokenToSol => self
        .rpc
        .get_balance(user)
        .await
        .map_err(|err| SwapFailure::from_rpc(&err)),
    }
  }
}
