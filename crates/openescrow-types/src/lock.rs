//! Per-key lock state.
//!
//! A key is LOCKED from the moment the seller deposits until the seller
//! unlocks it. While locked, deposits and withdrawals are blocked; only
//! `confirm` (buyer) and `unlock` (seller) may act.
//!
//! ```text
//!   ┌──────────┐  seller order   ┌────────┐
//!   │ UNLOCKED ├────────────────▶│ LOCKED │──┐ buyer confirm
//!   └──────────┘◀────────────────└────────┘◀─┘ (settles, flag kept)
//!                 seller unlock
//! ```

use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result};

/// Lock state of an `(id, seller, buyer)` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LockState {
    /// Either party may deposit or withdraw.
    #[default]
    Unlocked,
    /// The trade is in flight.
    Locked,
}

impl LockState {
    #[must_use]
    pub fn from_flag(locked: bool) -> Self {
        if locked { Self::Locked } else { Self::Unlocked }
    }

    #[must_use]
    pub fn is_locked(self) -> bool {
        self == Self::Locked
    }

    /// Guard for operations that need the key unlocked (`order`, `withdraw`).
    pub fn require_unlocked(self) -> Result<()> {
        match self {
            Self::Unlocked => Ok(()),
            Self::Locked => Err(EscrowError::WrongLockState {
                expected: Self::Unlocked,
            }),
        }
    }

    /// Guard for operations that need the key locked (`confirm`, `unlock`).
    pub fn require_locked(self) -> Result<()> {
        match self {
            Self::Locked => Ok(()),
            Self::Unlocked => Err(EscrowError::WrongLockState {
                expected: Self::Locked,
            }),
        }
    }
}

impl std::fmt::Display for LockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unlocked => write!(f, "UNLOCKED"),
            Self::Locked => write!(f, "LOCKED"),
        }
    }
}
