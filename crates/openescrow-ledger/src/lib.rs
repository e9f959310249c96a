//! # openescrow-ledger
//!
//! **Escrow Ledger**: the two-party escrow state machine and its fund
//! accounting.
//!
//! ## Architecture
//!
//! The ledger owns no ambient state. It is driven through explicit ports:
//! 1. **EscrowStore**: keyed balances, lock flags, contributions, fee rate
//!    (transactional; [`MemoryStore`] in-process)
//! 2. **ValueTransfer**: outbound native-currency payments, which may
//!    re-enter the ledger
//! 3. **CallContext**: the authenticated caller and attached value of each
//!    call
//!
//! ## Trade Flow
//!
//! ```text
//! buyer order ─▶ seller order (LOCKED) ─▶ buyer confirm ─▶ criss-cross payouts + fee
//!                       │
//!                       └─▶ seller unlock ─▶ withdraw (refund)
//! ```
//!
//! [`MemoryHost`] is a complete in-memory execution environment for tests
//! and embedding; [`SharedLedger`] serializes access from many threads.

pub mod host;
pub mod ledger;
pub mod settlement;
pub mod shared;
pub mod solvency;
pub mod store;
pub mod transfer;

pub use host::{MemoryHost, Recipient, RefusePayments};
pub use ledger::EscrowLedger;
pub use settlement::{compute_fee, Payout, PayoutLeg, Settlement, SettlementPlan};
pub use shared::SharedLedger;
pub use solvency::SolvencyCheck;
pub use store::{EscrowStore, MemoryStore};
pub use transfer::ValueTransfer;
