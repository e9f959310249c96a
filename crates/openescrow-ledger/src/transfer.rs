//! Outbound value transfer port.

use openescrow_types::{Address, U256};

use crate::{EscrowLedger, EscrowStore};

/// Moves native currency out of the ledger's account.
///
/// A transfer is a suspension point: the recipient may run arbitrary code
/// and call back into `ledger` before the transfer returns. The ledger
/// therefore zeroes every balance it is paying out **before** calling
/// `transfer`.
///
/// Implementations must be all-or-nothing per transfer: returning `false`
/// means neither the payment nor anything the recipient did during it
/// (including re-entrant ledger calls) took effect. Hosts use
/// [`EscrowLedger::begin_frame`] / [`EscrowLedger::rollback_frame`] for the
/// ledger side of that guarantee.
pub trait ValueTransfer<S: EscrowStore> {
    /// Pay `amount` from the ledger's account to `to`. Returns `true` if
    /// the payment was delivered.
    fn transfer(&mut self, ledger: &mut EscrowLedger<S>, to: Address, amount: U256) -> bool;
}
