//! Solvency audit for the ledger's native holdings.
//!
//! Two checks, run by hosts after any sequence of calls:
//! ```text
//! holdings == Σ(attached values received) - Σ(payouts delivered)
//! holdings >= Σ(escrow balances)
//! ```
//!
//! The first holds for every committed call. The second is an inequality:
//! funds stranded by repeat deposits or by refused confirm payouts stay in
//! the ledger's account after their escrow entry has been zeroed, and
//! [`SolvencyCheck::verify`] reports that surplus.
//!
//! The second check is not guaranteed. Contributions are keyed by
//! `(id, party)`, so a confirm where seller and buyer share one slot (the
//! same address on both sides, or an id reused across counterparties) can
//! pay out more than its key escrowed. The difference comes out of other
//! keys' funds and `verify` reports it as a `SolvencyViolation`.

use openescrow_types::{EscrowError, Result, U256};

/// Tracks value flowing into and out of the ledger's account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvencyCheck {
    /// Total attached value received by committed calls.
    inflows: U256,
    /// Total value delivered by outbound transfers.
    outflows: U256,
}

impl SolvencyCheck {
    /// Create a new tracker with nothing recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record value received by the ledger.
    pub fn record_inflow(&mut self, amount: U256) {
        self.inflows = self.inflows.saturating_add(amount);
    }

    /// Record value paid out by the ledger.
    pub fn record_outflow(&mut self, amount: U256) {
        self.outflows = self.outflows.saturating_add(amount);
    }

    #[must_use]
    pub fn total_inflows(&self) -> U256 {
        self.inflows
    }

    #[must_use]
    pub fn total_outflows(&self) -> U256 {
        self.outflows
    }

    /// What the ledger's account should hold: inflows - outflows.
    #[must_use]
    pub fn expected_holdings(&self) -> U256 {
        self.inflows.saturating_sub(self.outflows)
    }

    /// Verify `holdings` against the recorded flows and the escrowed total.
    ///
    /// Returns the stranded surplus (`holdings - escrowed`).
    ///
    /// # Errors
    /// Returns [`EscrowError::SolvencyViolation`] if holdings differ from
    /// the expected flow balance or do not cover `escrowed`.
    pub fn verify(&self, holdings: U256, escrowed: U256) -> Result<U256> {
        let expected = self.expected_holdings();
        if holdings != expected {
            return Err(EscrowError::SolvencyViolation {
                holdings,
                required: expected,
            });
        }
        holdings
            .checked_sub(escrowed)
            .ok_or(EscrowError::SolvencyViolation {
                holdings,
                required: escrowed,
            })
    }
}
