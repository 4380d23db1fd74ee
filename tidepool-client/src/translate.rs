//! Error taxonomy and translation.
//!
//! Every failure surfaced to callers is a [`SwapFailure`]: a stable
//! [`ErrorCategory`] plus free-form detail for logs. The translation
//! functions here collapse wallet, transport, decode, and on-chain
//! errors into that taxonomy, so the submission pipeline can branch on
//! category alone.

use anchor_client::solana_sdk::instruction::InstructionError;
use anchor_client::solana_sdk::transaction::TransactionError;
use thiserror::Error;
use tidepool_core::CoreError;
use tidepool_idl::error::{program_code, IdlError};

use crate::pool_state::PoolFetchError;
use crate::rpc::RpcError;
use crate::wallet::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
  /// User declined in the wallet UI. Terminal.
  UserRejected,
  /// No connected wallet or no usable signing method. Terminal.
  WalletUnavailable,
  /// Transport-level failure; a fresh attempt may succeed.
  TransientNetwork,
  /// Blockhash aged out before landing; retry with a fresh one.
  TransactionExpired,
  PoolNotFound,
  InvalidPoolConfiguration,
  SlippageExceeded,
  InsufficientLiquidity,
  InsufficientBalance,
  /// Caller-supplied amount or parameter was malformed.
  InvalidInput,
}

impl ErrorCategory {
  /// Whether the pipeline may attempt again after this failure.
  #[must_use]
  pub fn is_retryable(self) -> bool {
    matches!(
      self,
      ErrorCategory::TransientNetwork | ErrorCategory::TransactionExpired
    )
  }
}

#[derive(Debug, Clone, Error)]
#[error("{detail}")]
pub struct SwapFailure {
  pub category: ErrorCategory,
  pub detail: String,
}

impl SwapFailure {
  #[must_use]
  pub fn new(category: ErrorCategory, detail: impl Into<String>) -> Self {
    Self {
      category,
      detail: detail.into(),
    }
  }

  #[must_use]
  pub fn from_wallet(err: &WalletError) -> SwapFailure {
    let category = match err {
      WalletError::Rejected => ErrorCategory::UserRejected,
      WalletError::Unavailable => ErrorCategory::WalletUnavailable,
      WalletError::Provider(_) => ErrorCategory::TransientNetwork,
    };
    SwapFailure::new(category, err.to_string())
  }

  #[must_use]
  pub fn from_rpc(err: &RpcError) -> SwapFailure {
    match err {
      RpcError::Transaction(tx_err) => SwapFailure::from_transaction_error(tx_err),
      RpcError::Transport(_) | RpcError::Malformed(_) => {
        SwapFailure::new(ErrorCategory::TransientNetwork, err.to_string())
      }
    }
  }

  #[must_use]
  pub fn from_pool_fetch(err: &PoolFetchError) -> SwapFailure {
    match err {
      PoolFetchError::Rpc(rpc) => SwapFailure::from_rpc(rpc),
      PoolFetchError::InvalidConfiguration(_) => {
        SwapFailure::new(ErrorCategory::InvalidPoolConfiguration, err.to_string())
      }
      PoolFetchError::Malformed(IdlError::InvalidIdentity(_)) => {
        SwapFailure::new(ErrorCategory::InvalidInput, err.to_string())
      }
      PoolFetchError::Malformed(_) => {
        SwapFailure::new(ErrorCategory::InvalidPoolConfiguration, err.to_string())
      }
    }
  }

  /// Translates an on-chain transaction error. Program errors carried
  /// as custom codes map to the program's own taxonomy.
  #[must_use]
  pub fn from_transaction_error(err: &TransactionError) -> SwapFailure {
    let detail = err.to_string();
    match err {
      TransactionError::BlockhashNotFound => {
        SwapFailure::new(ErrorCategory::TransactionExpired, detail)
      }
      TransactionError::InsufficientFundsForFee => {
        SwapFailure::new(ErrorCategory::InsufficientBalance, detail)
      }
      TransactionError::InstructionError(_, InstructionError::Custom(code)) => {
        SwapFailure::from_program_code(*code, detail)
      }
      TransactionError::InstructionError(
        _,
        InstructionError::InsufficientFunds,
      ) => SwapFailure::new(ErrorCategory::InsufficientBalance, detail),
      _ => SwapFailure::new(ErrorCategory::TransientNetwork, detail),
    }
  }

  #[must_use]
  pub fn from_program_code(code: u32, detail: String) -> SwapFailure {
    let category = match code {
      program_code::INVALID_FEE_RATE => ErrorCategory::InvalidPoolConfiguration,
      program_code::POOL_NOT_FOUND => ErrorCategory::PoolNotFound,
      program_code::SLIPPAGE_EXCEEDED => ErrorCategory::SlippageExceeded,
      program_code::INSUFFICIENT_LIQUIDITY => {
        ErrorCategory::InsufficientLiquidity
      }
      _ => ErrorCategory::TransientNetwork,
    };
    SwapFailure::new(category, detail)
  }

  #[must_use]
  pub fn from_core(err: &CoreError) -> SwapFailure {
    let category = match err {
      CoreError::NoLiquidity => ErrorCategory::InsufficientLiquidity,
      CoreError::InvalidFeeRate(_) => ErrorCategory::InvalidPoolConfiguration,
      CoreError::InvalidSlippage(_)
      | CoreError::AmountOverflow
      | CoreError::ZeroAmount
      | CoreError::InvalidAmount(_)
      | CoreError::TooManyDecimals(_) => ErrorCategory::InvalidInput,
    };
    SwapFailure::new(category, err.to_string())
  }
}
