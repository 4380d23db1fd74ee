//! TTL-bounded pool state cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anchor_client::solana_sdk::pubkey::Pubkey;
use log::{debug, info};
use thiserror::Error;
use tidepool_core::swap::PoolReserves;
use tidepool_core::MAX_FEE_RATE_BPS;
use tidepool_idl::accounts::Pool;
use tidepool_idl::error::IdlError;
use tidepool_idl::pda::PoolAddresses;

use crate::rpc::{LedgerRpc, RpcError};

/// How long a fetched pool snapshot (or a confirmed absence) stays fresh.
pub const POOL_STATE_TTL: Duration = Duration::from_secs(30);

/// Injectable time source so tests control TTL expiry.
pub trait CacheClock: Send + Sync {
  fn now(&self) -> Instant;
}

pub struct SystemClock;

impl CacheClock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// Point-in-time pool snapshot. Reserves come from one account fetch, so
/// the pair is always internally consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
  pub token_mint: Pubkey,
  pub reserves: PoolReserves,
  pub lp_supply: u64,
  pub addresses: PoolAddresses,
}

#[derive(Debug, Clone, Error)]
pub enum PoolFetchError {
  #[error(transparent)]
  Rpc(#[from] RpcError),
  /// The account decoded but its fee rate is outside the accepted range;
  /// the pool is unusable, not absent.
  #[error("pool fee rate {0} bps is outside the accepted range")]
  InvalidConfiguration(u16),
  /// Something other than a pool account lives at the derived address.
  #[error(transparent)]
  Malformed(#[from] IdlError),
}

struct CacheEntry {
  fetched_at: Instant,
  state: Option<PoolState>,
}

/// Read-through cache over pool accounts, keyed by token mint.
///
/// Confirmed absences are cached like hits so a token with no pool does
/// not hammer the network. Transport errors are surfaced and never
/// cached. Writes are last-writer-wins: a snapshot is a point-in-time
/// read, never merged.
pub struct PoolStateCache<R> {
  rpc: Arc<R>,
  clock: Arc<dyn CacheClock>,
  ttl: Duration,
  entries: Mutex<HashMap<Pubkey, CacheEntry>>,
}

impl<R: LedgerRpc> PoolStateCache<R> {
  #[must_use]
  pub fn new(rpc: Arc<R>) -> Self {
    Self::with_clock(rpc, Arc::new(SystemClock), POOL_STATE_TTL)
  }

  #[must_use]
  pub fn with_clock(
    rpc: Arc<R>,
    clock: Arc<dyn CacheClock>,
    ttl: Duration,
  ) -> Self {
    Self {
      rpc,
      clock,
      ttl,
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Returns the pool state for a mint, fetching on miss or expiry.
  /// `Ok(None)` means "no pool exists", a terminal answer for this TTL
  /// window.
  ///
  /// # Errors
  /// - [`PoolFetchError::Rpc`] on transport failure (retryable, not cached)
  /// - [`PoolFetchError::InvalidConfiguration`] on an out-of-range fee rate
  /// - [`PoolFetchError::Malformed`] when the account is not a pool
  pub async fn get(
    &self,
    token_mint: Pubkey,
  ) -> Result<Option<PoolState>, PoolFetchError> {
    let now = self.clock.now();
    {
      let entries = self.entries.lock().expect("cache lock poisoned");
      if let Some(entry) = entries.get(&token_mint) {
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
          debug!("pool cache hit for {token_mint}");
          return Ok(entry.state);
        }
      }
    }

    let state = self.fetch(token_mint).await?;
    let mut entries = self.entries.lock().expect("cache lock poisoned");
    entries.insert(
      token_mint,
      CacheEntry {
        fetched_at: self.clock.now(),
        state,
      },
    );
    Ok(state)
  }

  /// Drops the cached entry so the next `get` hits the network. Must be
  /// called after every successful mutating operation against the pool.
  /// Idempotent.
  pub fn invalidate(&self, token_mint: Pubkey) {
    let mut entries = self.entries.lock().expect("cache lock poisoned");
    if entries.remove(&token_mint).is_some() {
      info!("invalidated pool state for {token_mint}");
    }
  }

  async fn fetch(
    &self,
    token_mint: Pubkey,
  ) -> Result<Option<PoolState>, PoolFetchError> {
    let addresses = PoolAddresses::derive(token_mint);
    let Some(account) = self.rpc.get_account(&addresses.pool).await? else {
      info!("no pool account for {token_mint}");
      return Ok(None);
    };
    let pool = Pool::try_deserialize(&account.data)?;
    if pool.fee_rate_bps > MAX_FEE_RATE_BPS {
      return Err(PoolFetchError::InvalidConfiguration(pool.fee_rate_bps));
    }
    Ok(Some(PoolState {
      token_mint,
      reserves: PoolReserves {
        token_reserve: pool.token_reserve,
        sol_reserve: pool.sol_reserve,
        fee_rate_bps: pool.fee_rate_bps,
      },
      lp_supply: pool.lp_supply,
      addresses,
    }))
  }
}
