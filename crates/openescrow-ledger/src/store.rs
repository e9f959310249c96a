//! Storage port for ledger state.
//!
//! The ledger never holds escrow state itself: it reads and writes through
//! an [`EscrowStore`], so the same state machine runs against the in-memory
//! [`MemoryStore`] in tests and against any persistent backend in
//! production.
//!
//! Stores are transactional. `begin` opens a (possibly nested) frame,
//! `commit` folds it into its parent and `rollback` discards every write made
//! since the matching `begin`, including writes from nested frames that were
//! already committed into it.

use std::collections::{HashMap, HashSet};

use openescrow_types::{Address, EscrowKey, LockState, OrderId, U256};

/// Keyed escrow state: balances, lock flags, contributions and the global
/// fee rate.
///
/// Zero / unlocked is the value of every key that was never written.
pub trait EscrowStore {
    /// Total held for `(id, seller, buyer)`.
    fn escrow(&self, key: &EscrowKey) -> U256;
    fn set_escrow(&mut self, key: EscrowKey, amount: U256);

    fn lock_state(&self, key: &EscrowKey) -> LockState;
    fn set_lock_state(&mut self, key: EscrowKey, state: LockState);

    /// Amount `party` deposited under `id`, regardless of counterparty.
    fn contribution(&self, id: OrderId, party: Address) -> U256;
    fn set_contribution(&mut self, id: OrderId, party: Address, amount: U256);

    fn fee_rate(&self) -> U256;
    fn set_fee_rate(&mut self, rate: U256);

    /// Sum of every escrow balance held. Saturates at `U256::MAX`.
    fn total_escrowed(&self) -> U256;

    /// Open a transaction frame.
    fn begin(&mut self);
    /// Fold the innermost frame into its parent (or make it durable).
    fn commit(&mut self);
    /// Undo every write since the innermost `begin`.
    fn rollback(&mut self);
}

/// Previous value of one written slot.
#[derive(Debug, Clone)]
enum Undo {
    Escrow(EscrowKey, U256),
    Lock(EscrowKey, LockState),
    Contribution(OrderId, Address, U256),
    FeeRate(U256),
}

/// In-memory [`EscrowStore`] with an undo log.
///
/// Zeroed balances and cleared locks are removed from the maps, so a key
/// that has been fully settled is indistinguishable from one never used.
#[derive(Debug, Default)]
pub struct MemoryStore {
    escrow: HashMap<EscrowKey, U256>,
    locked: HashSet<EscrowKey>,
    contributions: HashMap<(OrderId, Address), U256>,
    fee_rate: U256,
    /// Previous values, oldest first. Only recorded inside a frame.
    undo_log: Vec<Undo>,
    /// Undo-log length at each open `begin`.
    frames: Vec<usize>,
}

impl MemoryStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open transaction frames.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Number of keys with a non-zero escrow balance.
    #[must_use]
    pub fn open_escrows(&self) -> usize {
        self.escrow.len()
    }

    /// Number of keys currently locked.
    #[must_use]
    pub fn locked_count(&self) -> usize {
        self.locked.len()
    }

    fn record(&mut self, undo: Undo) {
        if !self.frames.is_empty() {
            self.undo_log.push(undo);
        }
    }

    fn write_escrow(&mut self, key: EscrowKey, amount: U256) {
        if amount.is_zero() {
            self.escrow.remove(&key);
        } else {
            self.escrow.insert(key, amount);
        }
    }

    fn write_lock(&mut self, key: EscrowKey, state: LockState) {
        if state.is_locked() {
            self.locked.insert(key);
        } else {
            self.locked.remove(&key);
        }
    }

    fn write_contribution(&mut self, id: OrderId, party: Address, amount: U256) {
        if amount.is_zero() {
            self.contributions.remove(&(id, party));
        } else {
            self.contributions.insert((id, party), amount);
        }
    }
}

impl EscrowStore for MemoryStore {
    fn escrow(&self, key: &EscrowKey) -> U256 {
        self.escrow.get(key).copied().unwrap_or_default()
    }

    fn set_escrow(&mut self, key: EscrowKey, amount: U256) {
        self.record(Undo::Escrow(key, self.escrow(&key)));
        self.write_escrow(key, amount);
    }

    fn lock_state(&self, key: &EscrowKey) -> LockState {
        LockState::from_flag(self.locked.contains(key))
    }

    fn set_lock_state(&mut self, key: EscrowKey, state: LockState) {
        self.record(Undo::Lock(key, self.lock_state(&key)));
        self.write_lock(key, state);
    }

    fn contribution(&self, id: OrderId, party: Address) -> U256 {
        self.contributions
            .get(&(id, party))
            .copied()
            .unwrap_or_default()
    }

    fn set_contribution(&mut self, id: OrderId, party: Address, amount: U256) {
        self.record(Undo::Contribution(id, party, self.contribution(id, party)));
        self.write_contribution(id, party, amount);
    }

    fn fee_rate(&self) -> U256 {
        self.fee_rate
    }

    fn set_fee_rate(&mut self, rate: U256) {
        self.record(Undo::FeeRate(self.fee_rate));
        self.fee_rate = rate;
    }

    fn total_escrowed(&self) -> U256 {
        self.escrow
            .values()
            .fold(U256::zero(), |acc, amount| acc.saturating_add(*amount))
    }

    fn begin(&mut self) {
        self.frames.push(self.undo_log.len());
    }

    fn commit(&mut self) {
        self.frames.pop();
        if self.frames.is_empty() {
            self.undo_log.clear();
        }
    }

    fn rollback(&mut self) {
        let Some(mark) = self.frames.pop() else {
            return;
        };
        while self.undo_log.len() > mark {
            let Some(undo) = self.undo_log.pop() else {
                break;
            };
            match undo {
                Undo::Escrow(key, amount) => self.write_escrow(key, amount),
                Undo::Lock(key, state) => self.write_lock(key, state),
                Undo::Contribution(id, party, amount) => {
                    self.write_contribution(id, party, amount);
                }
                Undo::FeeRate(rate) => self.fee_rate = rate,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> EscrowKey {
        EscrowKey::new(OrderId::from(n), Address::dummy(1), Address::dummy(2))
    }

    #[test]
    fn unwritten_keys_are_empty() {
        let store = MemoryStore::new();
        assert!(store.escrow(&key(1)).is_zero());
        assert_eq!(store.lock_state(&key(1)), LockState::Unlocked);
        assert!(store.contribution(OrderId::from(1), Address::dummy(1)).is_zero());
        assert!(store.total_escrowed().is_zero());
    }

    #[test]
    fn zeroed_entries_are_removed() {
        let mut store = MemoryStore::new();
        store.set_escrow(key(1), U256::from(100));
        store.set_lock_state(key(1), LockState::Locked);
        assert_eq!(store.open_escrows(), 1);
        assert_eq!(store.locked_count(), 1);

        store.set_escrow(key(1), U256::zero());
        store.set_lock_state(key(1), LockState::Unlocked);
        assert_eq!(store.open_escrows(), 0);
        assert_eq!(store.locked_count(), 0);
    }

    #[test]
    fn writes_outside_a_frame_are_not_logged() {
        let mut store = MemoryStore::new();
        store.set_fee_rate(U256::from(100));
        store.rollback();
        assert_eq!(store.fee_rate(), U256::from(100));
    }

    #[test]
    fn rollback_restores_previous_values() {
        let mut store = MemoryStore::new();
        store.set_escrow(key(1), U256::from(100));

        store.begin();
        store.set_escrow(key(1), U256::from(250));
        store.set_escrow(key(2), U256::from(7));
        store.set_lock_state(key(1), LockState::Locked);
        store.set_contribution(OrderId::from(1), Address::dummy(1), U256::from(150));
        store.set_fee_rate(U256::from(30));
        store.rollback();

        assert_eq!(store.escrow(&key(1)), U256::from(100));
        assert!(store.escrow(&key(2)).is_zero());
        assert_eq!(store.lock_state(&key(1)), LockState::Unlocked);
        assert!(store.contribution(OrderId::from(1), Address::dummy(1)).is_zero());
        assert!(store.fee_rate().is_zero());
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn commit_keeps_writes() {
        let mut store = MemoryStore::new();
        store.begin();
        store.set_escrow(key(1), U256::from(100));
        store.commit();
        assert_eq!(store.escrow(&key(1)), U256::from(100));
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn outer_rollback_undoes_committed_inner_frame() {
        let mut store = MemoryStore::new();
        store.begin();
        store.set_escrow(key(1), U256::from(10));

        store.begin();
        store.set_escrow(key(1), U256::from(20));
        store.commit();
        assert_eq!(store.escrow(&key(1)), U256::from(20));

        store.rollback();
        assert!(store.escrow(&key(1)).is_zero());
    }

    #[test]
    fn inner_rollback_keeps_outer_writes() {
        let mut store = MemoryStore::new();
        store.begin();
        store.set_escrow(key(1), U256::from(10));

        store.begin();
        store.set_escrow(key(1), U256::from(20));
        store.rollback();
        assert_eq!(store.escrow(&key(1)), U256::from(10));

        store.commit();
        assert_eq!(store.escrow(&key(1)), U256::from(10));
    }

    #[test]
    fn total_escrowed_sums_all_keys() {
        let mut store = MemoryStore::new();
        store.set_escrow(key(1), U256::from(100));
        store.set_escrow(key(2), U256::from(50));
        assert_eq!(store.total_escrowed(), U256::from(150));
    }
}
