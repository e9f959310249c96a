//! Error types for the OpenEscrow ledger.
//!
//! All errors use the `ESC_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by concern:
//! - 1xx: Authorization errors
//! - 2xx: Input errors (amounts, addresses)
//! - 3xx: Lock state errors
//! - 4xx: Transfer errors
//! - 5xx: Arithmetic errors
//! - 6xx: Audit errors
//! - 9xx: General / configuration errors
//!
//! Every error aborts the call that raised it. The ledger rolls back all
//! state staged in that call before returning the error.

use primitive_types::U256;
use thiserror::Error;

/// Central error enum for all OpenEscrow operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller is not the identity required by the operation.
    #[error("ESC_ERR_100: Unauthorized caller")]
    Unauthorized,

    // =================================================================
    // Input Errors (2xx)
    // =================================================================
    /// A required amount (attached value or contribution) is zero.
    #[error("ESC_ERR_200: Invalid amount: must be non-zero")]
    InvalidAmount,

    /// A required address is the zero address.
    #[error("ESC_ERR_201: Invalid address")]
    InvalidAddress,

    // =================================================================
    // Lock State Errors (3xx)
    // =================================================================
    /// The escrow key is locked when it must be unlocked, or vice versa.
    #[error("ESC_ERR_300: Wrong lock state: expected {expected}")]
    WrongLockState { expected: crate::LockState },

    // =================================================================
    // Transfer Errors (4xx)
    // =================================================================
    /// An outbound value transfer did not succeed.
    #[error("ESC_ERR_400: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // Arithmetic Errors (5xx)
    // =================================================================
    /// Checked arithmetic overflowed or underflowed.
    #[error("ESC_ERR_500: Arithmetic overflow in {context}")]
    ArithmeticOverflow { context: &'static str },

    // =================================================================
    // Audit Errors (6xx)
    // =================================================================
    /// Native holdings do not match what the ledger owes or expects.
    #[error("ESC_ERR_600: Solvency violation: holdings {holdings}, required {required}")]
    SolvencyViolation { holdings: U256, required: U256 },

    // =================================================================
    // General / Configuration (9xx)
    // =================================================================
    /// Configuration error (malformed JSON, zero deposit address, ...).
    #[error("ESC_ERR_900: Configuration error: {0}")]
    Configuration(String),
}

impl EscrowError {
    /// Shorthand for a `TransferFailed` error.
    #[must_use]
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, EscrowError>;

impl From<serde_json::Error> for EscrowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
