//! Transaction submission and confirmation.
//!
//! One submission is a bounded loop: compile against a fresh blockhash,
//! hand the transaction to whichever wallet capability is available, then
//! poll the signature until it confirms or the budget runs out. Expiry
//! earns exactly one extra attempt on a shorter budget; terminal
//! categories stop the loop immediately.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::instruction::Instruction;
use anchor_client::solana_sdk::message::{v0, VersionedMessage};
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use log::{debug, info, warn};

use crate::rpc::LedgerRpc;
use crate::translate::{ErrorCategory, SwapFailure};
use crate::wallet::WalletCapabilities;

#[derive(Debug, Clone, Copy)]
pub struct SubmissionConfig {
  /// Full attempts, each with its own blockhash.
  pub max_send_attempts: u32,
  pub confirm_timeout: Duration,
  /// Budget for the single retry granted after a blockhash expiry.
  pub expiry_retry_timeout: Duration,
  pub poll_interval: Duration,
}

impl Default for SubmissionConfig {
  fn default() -> Self {
    Self {
      max_send_attempts: 3,
      confirm_timeout: Duration::from_secs(30),
      expiry_retry_timeout: Duration::from_secs(20),
      poll_interval: Duration::from_millis(500),
    }
  }
}

/// Where a submission currently stands; surfaces in logs only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
  Preparing,
  Signing,
  Confirming,
  Confirmed,
  Failed,
}

impl fmt::Display for SubmissionPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      SubmissionPhase::Preparing => "preparing",
      SubmissionPhase::Signing => "signing",
      SubmissionPhase::Confirming => "confirming",
      SubmissionPhase::Confirmed => "confirmed",
      SubmissionPhase::Failed => "failed",
    };
    f.write_str(name)
  }
}

/// One attempt's state, passed by value rather than mutated in place.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionAttempt {
  pub number: u32,
  pub blockhash: Hash,
  pub skip_preflight: bool,
  pub confirm_budget: Duration,
}

pub struct SubmissionPipeline<R> {
  rpc: Arc<R>,
  config: SubmissionConfig,
}

impl<R: LedgerRpc> SubmissionPipeline<R> {
  pub fn new(rpc: Arc<R>) -> Self {
    Self::with_config(rpc, SubmissionConfig::default())
  }

  pub fn with_config(rpc: Arc<R>, config: SubmissionConfig) -> Self {
    Self { rpc, config }
  }

  /// Submits an instruction list and waits for confirmation.
  ///
  /// # Errors
  /// Returns the last [`SwapFailure`] once every attempt is exhausted, or
  /// the first terminal failure.
  pub async fn submit(
    &self,
    instructions: &[Instruction],
    fee_payer: Pubkey,
    wallet: &WalletCapabilities,
  ) -> Result<Signature, SwapFailure> {
    let mut last_failure =
      SwapFailure::new(ErrorCategory::TransientNetwork, "no attempt made");
    for number in 1..=self.config.max_send_attempts {
      // Preflight catches compile-time mistakes on the first try; later
      // tries skip it so a node-side simulation hiccup cannot starve us.
      let attempt = SubmissionAttempt {
        number,
        blockhash: Hash::default(),
        skip_preflight: number > 1,
        confirm_budget: self.config.confirm_timeout,
      };
      match self.attempt(instructions, fee_payer, wallet, attempt).await {
        Ok(signature) => return Ok(signature),
        Err(failure) if failure.category == ErrorCategory::TransactionExpired => {
          warn!("attempt {number} expired, retrying once with fresh blockhash");
          let retry = SubmissionAttempt {
            skip_preflight: true,
            confirm_budget: self.config.expiry_retry_timeout,
            ..attempt
          };
          return self.attempt(instructions, fee_payer, wallet, retry).await;
        }
        Err(failure) if failure.category.is_retryable() => {
          warn!("attempt {number} failed ({failure}), retrying");
          last_failure = failure;
        }
        Err(failure) => return Err(failure),
      }
    }
    Err(last_failure)
  }

  /// One compile-sign-send-confirm round against a fresh blockhash.
  async fn attempt(
    &self,
    instructions: &[Instruction],
    fee_payer: Pubkey,
    wallet: &WalletCapabilities,
    mut attempt: SubmissionAttempt,
  ) -> Result<Signature, SwapFailure> {
    debug!("attempt {}: {}", attempt.number, SubmissionPhase::Preparing);
    attempt.blockhash = self
      .rpc
      .latest_blockhash()
      .await
      .map_err(|err| SwapFailure::from_rpc(&err))?;
    let message =
      v0::Message::try_compile(&fee_payer, instructions, &[], attempt.blockhash)
        .map_err(|err| {
          SwapFailure::new(ErrorCategory::InvalidInput, err.to_string())
        })?;
    let signature_count = message.header.num_required_signatures as usize;
    let transaction = VersionedTransaction {
      signatures: vec![Signature::default(); signature_count],
      message: VersionedMessage::V0(message),
    };
    debug!("attempt {}: {}", attempt.number, SubmissionPhase::Signing);
    let signature = self
      .sign_and_send(transaction, wallet, attempt.skip_preflight)
      .await?;
    debug!(
      "attempt {}: {} {signature}",
      attempt.number,
      SubmissionPhase::Confirming
    );
    if let Err(failure) = self.confirm(signature, attempt.confirm_budget).await {
      warn!(
        "attempt {}: {} ({failure})",
        attempt.number,
        SubmissionPhase::Failed
      );
      return Err(failure);
    }
    info!("{}: {signature}", SubmissionPhase::Confirmed);
    Ok(signature)
  }

  /// Dispatches through the richest capability available: unified send,
  /// then single sign, then batch sign.
  async fn sign_and_send(
    &self,
    transaction: VersionedTransaction,
    wallet: &WalletCapabilities,
    skip_preflight: bool,
  ) -> Result<Signature, SwapFailure> {
    if let Some(sender) = &wallet.send {
      return sender
        .send_transaction(&transaction)
        .await
        .map_err(|err| SwapFailure::from_wallet(&err));
    }
    let signed = if let Some(signer) = &wallet.sign {
      signer
        .sign_transaction(transaction)
        .await
        .map_err(|err| SwapFailure::from_wallet(&err))?
    } else if let Some(signer) = &wallet.sign_all {
      let mut signed = signer
        .sign_all_transactions(vec![transaction])
        .await
        .map_err(|err| SwapFailure::from_wallet(&err))?;
      signed.pop().ok_or_else(|| {
        SwapFailure::new(
          ErrorCategory::WalletUnavailable,
          "wallet returned no signed transaction",
        )
      })?
    } else {
      return Err(SwapFailure::new(
        ErrorCategory::WalletUnavailable,
        "wallet exposes no signing method",
      ));
    };
    self
      .rpc
      .send_transaction(&signed, skip_preflight)
      .await
      .map_err(|err| SwapFailure::from_rpc(&err))
  }

  /// Polls the signature until it lands or the budget runs out. A landed
  /// transaction that failed on-chain is a failure, not a success.
  async fn confirm(
    &self,
    signature: Signature,
    budget: Duration,
  ) -> Result<(), SwapFailure> {
    let poll = async {
      loop {
        match self.rpc.signature_status(&signature).await {
          Ok(Some(Ok(()))) => return Ok(()),
          Ok(Some(Err(tx_err))) => {
            return Err(SwapFailure::from_transaction_error(&tx_err));
          }
          Ok(None) => {}
          // Status polls are cheap to repeat; a flaky poll must not fail
          // a transaction that may already have landed.
          Err(err) => warn!("status poll for {signature} failed: {err}"),
        }
        tokio::time::sleep(self.config.poll_interval).await;
      }
    };
    match tokio::time::timeout(budget, poll).await {
      Ok(result) => result,
      Err(_) => Err(SwapFailure::new(
        ErrorCategory::TransactionExpired,
        format!("no confirmation for {signature} within {budget:?}"),
      )),
    }
  }
}
