//! Client SDK for the Tidepool constant-product AMM.
//!
//! Layers, bottom up: [`rpc`] abstracts the ledger behind a trait,
//! [`pool_state`] caches decoded pool accounts under a short TTL,
//! [`wallet`] normalizes signer providers into one capability record,
//! [`assembler`] builds instruction lists, [`pipeline`] drives
//! send-and-confirm with bounded retries, and [`swap_client`] ties it all
//! into quote and execute entry points. Errors converge on the taxonomy
//! in [`translate`].

pub mod assembler;
pub mod pipeline;
pub mod pool_state;
pub mod rpc;
pub mod swap_client;
pub mod token_directory;
pub mod translate;
pub mod wallet;

pub use assembler::{PoolOperation, TransactionAssembler};
pub use pipeline::{
  SubmissionAttempt, SubmissionConfig, SubmissionPhase, SubmissionPipeline,
};
pub use pool_state::{PoolFetchError, PoolState, PoolStateCache};
pub use rpc::{LedgerRpc, RpcError, SolanaLedgerRpc};
pub use swap_client::{ClientQuote, SwapClient, SwapOutcome};
pub use token_directory::{
  CachedTokenDirectory, StaticTokenDirectory, TokenDirectory, TokenMetadata,
};
pub use translate::{ErrorCategory, SwapFailure};
pub use wallet::{
  normalize_provider, InjectedRegistry, LocalWallet, ProviderSource,
  WalletCapabilities, WalletError,
};
