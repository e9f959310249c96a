//! System-wide constants for the OpenEscrow ledger.

/// Fee rate installed at construction. At the scale below, 100 means 1%.
pub const DEFAULT_FEE_RATE: u64 = 100;

/// Multiplier applied to the buyer's contribution before the fee rate.
pub const FEE_MULTIPLIER: u64 = 100;

/// Divisor of the fee formula:
/// `fee = contribution * FEE_MULTIPLIER * fee_rate / FEE_DENOMINATOR`.
pub const FEE_DENOMINATOR: u64 = 1_000_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Ledger name.
pub const LEDGER_NAME: &str = "OpenEscrow";
