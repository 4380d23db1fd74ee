//! Token metadata lookup.
//!
//! Metadata is advisory: a missing entry never blocks a swap, it only
//! degrades amount formatting to default decimals.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anchor_client::solana_sdk::pubkey::Pubkey;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::pool_state::{CacheClock, SystemClock};

/// How long a directory answer (including "not listed") stays fresh.
pub const TOKEN_METADATA_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
  pub name: String,
  pub symbol: String,
  pub decimals: u8,
}

#[async_trait]
pub trait TokenDirectory: Send + Sync {
  /// `Ok(None)` means the mint is not listed; that is a cacheable answer,
  /// not an error.
  async fn lookup(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>>;
}

/// Fixed in-memory listing. Backs tests and offline configurations.
#[derive(Default)]
pub struct StaticTokenDirectory {
  entries: HashMap<Pubkey, TokenMetadata>,
}

impl StaticTokenDirectory {
  #[must_use]
  pub fn new(entries: HashMap<Pubkey, TokenMetadata>) -> Self {
    Self { entries }
  }
}

#[async_trait]
impl TokenDirectory for StaticTokenDirectory {
  async fn lookup(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>> {
    Ok(self.entries.get(mint).cloned())
  }
}

struct DirectoryEntry {
  fetched_at: Instant,
  metadata: Option<TokenMetadata>,
}

/// Read-through TTL cache over any [`TokenDirectory`].
pub struct CachedTokenDirectory<D> {
  inner: D,
  clock: Arc<dyn CacheClock>,
  ttl: Duration,
  entries: Mutex<HashMap<Pubkey, DirectoryEntry>>,
}

impl<D: TokenDirectory> CachedTokenDirectory<D> {
  pub fn new(inner: D) -> Self {
    Self::with_clock(inner, Arc::new(SystemClock))
  }

  pub fn with_clock(inner: D, clock: Arc<dyn CacheClock>) -> Self {
    Self {
      inner,
      clock,
      ttl: TOKEN_METADATA_TTL,
      entries: Mutex::new(HashMap::new()),
    }
  }
}

#[async_trait]
impl<D: TokenDirectory> TokenDirectory for CachedTokenDirectory<D> {
  async fn lookup(&self, mint: &Pubkey) -> Result<Option<TokenMetadata>> {
    let now = self.clock.now();
    {
      let entries = self.entries.lock().await;
      if let Some(entry) = entries.get(mint) {
        if now.duration_since(entry.fetched_at) < self.ttl {
          return Ok(entry.metadata.clone());
        }
      }
    }
    let metadata = self.inner.lookup(mint).await?;
    debug!("token directory refresh for {mint}: listed={}", metadata.is_some());
    let mut entries = self.entries.lock().await;
    entries.insert(
      *mint,
      DirectoryEntry {
        fetched_at: now,
        metadata: metadata.clone(),
      },
    );
    Ok(metadata)
  }
}
