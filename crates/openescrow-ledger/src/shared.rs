//! Thread-safe handle to a ledger.
//!
//! The ledger assumes calls run one at a time to completion. When several
//! threads drive the same ledger, [`SharedLedger`] serializes them: each
//! closure passed to [`SharedLedger::with`] holds the lock for the whole
//! operation, including its outbound transfers and any re-entrant calls
//! those transfers make.

use std::sync::Arc;

use openescrow_types::{Address, OrderId, U256};
use parking_lot::Mutex;

use crate::{EscrowLedger, EscrowStore, MemoryStore};

/// Cloneable, lock-guarded ledger handle.
pub struct SharedLedger<S: EscrowStore = MemoryStore> {
    inner: Arc<Mutex<EscrowLedger<S>>>,
}

impl<S: EscrowStore> SharedLedger<S> {
    #[must_use]
    pub fn new(ledger: EscrowLedger<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    /// Run `f` with exclusive access to the ledger.
    pub fn with<R>(&self, f: impl FnOnce(&mut EscrowLedger<S>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    #[must_use]
    pub fn escrow_of(&self, seller: Address, buyer: Address, id: OrderId) -> U256 {
        self.inner.lock().escrow_of(seller, buyer, id)
    }

    #[must_use]
    pub fn locked_of(&self, seller: Address, buyer: Address, id: OrderId) -> bool {
        self.inner.lock().locked_of(seller, buyer, id)
    }

    #[must_use]
    pub fn contribution_of(&self, id: OrderId, party: Address) -> U256 {
        self.inner.lock().contribution_of(id, party)
    }
}

impl<S: EscrowStore> Clone for SharedLedger<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
