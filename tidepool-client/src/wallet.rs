//! Signer-provider normalization.
//!
//! Wallet providers come in several shapes: a context object exposing the
//! signing methods directly, an object wrapping them under an `adapter`
//! field, or nothing at all, in which case known injected providers are
//! scanned. [`normalize_provider`] flattens all of them into one
//! [`WalletCapabilities`] value object; everything downstream branches on
//! that record and never on provider identity.

use std::fmt;
use std::sync::Arc;

use anchor_client::solana_sdk::pubkey::Pubkey;
use anchor_client::solana_sdk::signature::{Keypair, Signature};
use anchor_client::solana_sdk::signer::Signer;
use anchor_client::solana_sdk::transaction::VersionedTransaction;
use async_trait::async_trait;
use log::debug;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum WalletError {
  /// The user declined in the provider UI. Terminal; never retried.
  #[error("user rejected the request")]
  Rejected,
  /// No provider, or the provider exposes no usable signing method.
  #[error("wallet is not connected or exposes no signer")]
  Unavailable,
  #[error("wallet provider failure: {0}")]
  Provider(String),
}

/// Unified send-and-confirm capability, the preferred pathway.
#[async_trait]
pub trait TransactionSender: Send + Sync {
  async fn send_transaction(
    &self,
    transaction: &VersionedTransaction,
  ) -> Result<Signature, WalletError>;
}

#[async_trait]
pub trait TransactionSigner: Send + Sync {
  async fn sign_transaction(
    &self,
    transaction: VersionedTransaction,
  ) -> Result<VersionedTransaction, WalletError>;
}

#[async_trait]
pub trait BatchTransactionSigner: Send + Sync {
  async fn sign_all_transactions(
    &self,
    transactions: Vec<VersionedTransaction>,
  ) -> Result<Vec<VersionedTransaction>, WalletError>;
}

/// Normalized capability set of a signer provider.
///
/// Recomputed per call (provider identity can change between UI renders);
/// never mutated. All fields absent is a valid read-only result.
#[derive(Clone, Default)]
pub struct WalletCapabilities {
  pub address: Option<Pubkey>,
  pub send: Option<Arc<dyn TransactionSender>>,
  pub sign: Option<Arc<dyn TransactionSigner>>,
  pub sign_all: Option<Arc<dyn BatchTransactionSigner>>,
}

impl WalletCapabilities {
  /// True when no signing pathway is available.
  #[must_use]
  pub fn is_read_only(&self) -> bool {
    self.address.is_none()
      || (self.send.is_none() && self.sign.is_none() && self.sign_all.is_none())
  }
}

impl fmt::Debug for WalletCapabilities {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("WalletCapabilities")
      .field("address", &self.address)
      .field("send", &self.send.is_some())
      .field("sign", &self.sign.is_some())
      .field("sign_all", &self.sign_all.is_some())
      .finish()
  }
}

/// The shapes a caller may hand us.
pub enum ProviderSource {
  /// A context object exposing the capabilities directly.
  Context(WalletCapabilities),
  /// A wrapper holding the real provider under an `adapter` field.
  Adapter { adapter: WalletCapabilities },
  /// Nothing supplied; scan the injected-provider registry.
  Detected,
}

/// Known globally-injected providers, in preference order.
#[derive(Default)]
pub struct InjectedRegistry {
  providers: Vec<WalletCapabilities>,
}

impl InjectedRegistry {
  #[must_use]
  pub fn new(providers: Vec<WalletCapabilities>) -> Self {
    Self { providers }
  }

  /// Best-effort scan: first provider with a usable signer wins.
  #[must_use]
  pub fn scan(&self) -> WalletCapabilities {
    self
      .providers
      .iter()
      .find(|caps| !caps.is_read_only())
      .cloned()
      .unwrap_or_default()
  }
}

/// Flattens any provider shape into one capability record. Never fails;
/// a missing or capability-less provider yields a read-only record.
#[must_use]
pub fn normalize_provider(
  source: ProviderSource,
  injected: &InjectedRegistry,
) -> WalletCapabilities {
  let caps = match source {
    ProviderSource::Context(caps) => caps,
    ProviderSource::Adapter { adapter } => adapter,
    ProviderSource::Detected => injected.scan(),
  };
  debug!("normalized wallet provider: {caps:?}");
  caps
}

/// Keypair-backed wallet exposing every capability except unified send.
/// Used by tests and non-browser callers.
pub struct LocalWallet {
  keypair: Arc<Keypair>,
}

impl LocalWallet {
  #[must_use]
  pub fn new(keypair: Keypair) -> Self {
    Self {
      keypair: Arc::new(keypair),
    }
  }

  #[must_use]
  pub fn address(&self) -> Pubkey {
    self.keypair.pubkey()
  }

  /// Capability record for this wallet: sign and sign-all, no unified
  /// send.
  #[must_use]
  pub fn capabilities(self: &Arc<Self>) -> WalletCapabilities {
    WalletCapabilities {
      address: Some(self.address()),
      send: None,
      sign: Some(self.clone()),
      sign_all: Some(self.clone()),
    }
  }

  fn sign(&self, mut tx: VersionedTransaction) -> VersionedTransaction {
    let signature = self.keypair.sign_message(&tx.message.serialize());
    if tx.signatures.is_empty() {
      tx.signatures = vec![signature];
    } else {
      tx.signatures[0] = signature;
    }
    tx
  }
}

#[async_trait]
impl TransactionSigner for LocalWallet {
  async fn sign_transaction(
    &self,
    transaction: VersionedTransaction,
  ) -> Result<VersionedTransaction, WalletError> {
    Ok(self.sign(transaction))
  }
}

#[async_trait]
impl BatchTransactionSigner for LocalWallet {
  async fn sign_all_transactions(
    &self,
    transactions: Vec<VersionedTransaction>,
  ) -> Result<Vec<VersionedTransaction>, WalletError> {
    Ok(transactions.into_iter().map(|tx| self.sign(tx)).collect())
  }
}
