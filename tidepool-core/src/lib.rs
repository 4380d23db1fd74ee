//! Pure integer math for the Tidepool constant-product AMM.
//!
//! Everything here mirrors the on-chain program's fixed-point arithmetic:
//! raw smallest-unit `u64` amounts with `u128` intermediates and floor
//! division. Conversion to human-readable decimals happens only at the
//! display boundary (`decimal`), never inside quote computation.

pub mod decimal;
pub mod error;
pub mod liquidity;
pub mod swap;

pub use decimal::{format_amount, parse_amount};
pub use error::CoreError;
pub use swap::{quote_swap, PoolReserves, SwapDirection, SwapQuote};

/// Denominator for all basis-point arithmetic.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Highest fee rate at which a pool is considered valid.
pub const MAX_FEE_RATE_BPS: u16 = 1_000;

/// Fraction of the post-slippage amount kept as the minimum, in basis
/// points. Absorbs rounding drift between this client's integer math and
/// the on-chain program's.
pub const SAFETY_MARGIN_BPS: u64 = 9_700;

/// Display-only ceiling for the reported price impact percentage.
pub const PRICE_IMPACT_CAP_PCT: f64 = 15.0;
