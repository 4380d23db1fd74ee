//! Ledger RPC abstraction (enables testing).
//!
//! Every call site in the SDK goes through [`LedgerRpc`] so tests can
//! script network behavior. [`RpcError`] separates on-chain transaction
//! failures from transport failures; the distinction drives the retry
//! policy in the submission pipeline.

use std::sync::Arc;

use anchor_client::solana_sdk::account::Account;
use anchor_client::solana_sdk::commitment_config::CommitmentConfig;
use anchor_client::solana_sdk::hash::Hash;
use anchor_client::solana_sdk::program_pack::Pack;
use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::Signature;
use anchor_client::solana_sdk::transaction::{
  TransactionError, VersionedTransaction,
};
use anchor_spl::token::spl_token;
use async_trait::async_trait;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::config::RpcSendTransactionConfig;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RpcError {
  /// The node evaluated the transaction and it failed.
  #[error("transaction failed: {0}")]
  Transaction(TransactionError),
  /// Anything between us and an answer: connection, timeout, node error.
  #[error("rpc transport: {0}")]
  Transport(String),
  /// An account was fetched but does not hold what its address implies.
  #[error("unexpected account data at {0}")]
  Malformed(Pubkey),
}

/// The ledger surface this SDK consumes.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
  /// Fetches an account; `Ok(None)` is a confirmed absence, distinct from
  /// a transport failure.
  async fn get_account(
    &self,
    address: &Pubkey,
  ) -> Result<Option<Account>, RpcError>;

  async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError>;

  /// Raw balance of a token account, `Ok(None)` when the account does not
  /// exist.
  async fn get_token_balance(
    &self,
    token_account: &Pubkey,
  ) -> Result<Option<u64>, RpcError>;

  async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

  async fn send_transaction(
    &self,
    transaction: &VersionedTransaction,
    skip_preflight: bool,
  ) -> Result<Signature, RpcError>;

  /// Processed status of a signature: `None` until the network has seen
  /// it, then the transaction's own result.
  async fn signature_status(
    &self,
    signature: &Signature,
  ) -> Result<Option<Result<(), TransactionError>>, RpcError>;

  async fn account_exists(&self, address: &Pubkey) -> Result<bool, RpcError> {
    Ok(self.get_account(address).await?.is_some())
  }
}

/// Production implementation over Solana's nonblocking `RpcClient`.
pub struct SolanaLedgerRpc {
  client: Arc<RpcClient>,
  commitment: CommitmentConfig,
}

impl SolanaLedgerRpc {
  #[must_use]
  pub fn new(client: Arc<RpcClient>) -> Self {
    Self {
      client,
      commitment: CommitmentConfig::confirmed(),
    }
  }

  #[must_use]
  pub fn with_commitment(
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
  ) -> Self {
    Self { client, commitment }
  }
}

fn map_client_error(err: solana_rpc_client_api::client_error::Error) -> RpcError {
  match err.get_transaction_error() {
    Some(tx_err) => RpcError::Transaction(tx_err),
    None => RpcError::Transport(err.to_string()),
  }
}

#[async_trait]
impl LedgerRpc for SolanaLedgerRpc {
  async fn get_account(
    &self,
    address: &Pubkey,
  ) -> Result<Option<Account>, RpcError> {
    let response = self
      .client
      .get_account_with_commitment(address, self.commitment)
      .await
      .map_err(map_client_error)?;
    Ok(response.value)
  }

  async fn get_balance(&self, address: &Pubkey) -> Result<u64, RpcError> {
    self
      .client
      .get_balance(address)
      .await
      .map_err(map_client_error)
  }

  async fn get_token_balance(
    &self,
    token_account: &Pubkey,
  ) -> Result<Option<u64>, RpcError> {
    let Some(account) = self.get_account(token_account).await? else {
      return Ok(None);
    };
    let parsed = spl_token::state::Account::unpack(&account.data)
      .map_err(|_| RpcError::Malformed(*token_account))?;
    Ok(Some(parsed.amount))
  }

  async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
    self
      .client
      .get_latest_blockhash()
      .await
      .map_err(map_client_error)
  }

  async fn send_transaction(
    &self,
    transaction: &VersionedTransaction,
    skip_preflight: bool,
  ) -> Result<Signature, RpcError> {
    let config = RpcSendTransactionConfig {
      skip_preflight,
      preflight_commitment: Some(self.commitment.commitment),
      ..RpcSendTransactionConfig::default()
    };
    self
      .client
      .send_transaction_with_config(transaction, config)
      .await
      .map_err(map_client_error)
  }

  async fn signature_status(
    &self,
    signature: &Signature,
  ) -> Result<Option<Result<(), TransactionError>>, RpcError> {
    self
      .client
      .get_signature_status(signature)
      .await
      .map_err(map_client_error)
  }
}
