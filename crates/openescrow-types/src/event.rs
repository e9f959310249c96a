//! Ledger notifications.
//!
//! Every successful mutating call emits exactly one [`LedgerEvent`]. Events
//! staged by a call that later aborts are discarded with the rest of its
//! state, so the event log only ever describes committed transitions.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{Address, OrderId};

/// Kind of notification, used for filtering and log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Order,
    Withdraw,
    Unlock,
    Confirm,
    InstantPay,
    FeeChanged,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => write!(f, "ORDER"),
            Self::Withdraw => write!(f, "WITHDRAW"),
            Self::Unlock => write!(f, "UNLOCK"),
            Self::Confirm => write!(f, "CONFIRM"),
            Self::InstantPay => write!(f, "INSTANT_PAY"),
            Self::FeeChanged => write!(f, "FEE_CHANGED"),
        }
    }
}

/// An observable record of one committed ledger transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A party deposited `amount` against `(id, seller, buyer)`.
    Order {
        seller: Address,
        buyer: Address,
        id: OrderId,
        amount: U256,
    },
    /// A party took back its contribution.
    Withdraw {
        seller: Address,
        buyer: Address,
        id: OrderId,
        amount: U256,
    },
    /// The seller released the lock without moving funds.
    Unlock {
        seller: Address,
        buyer: Address,
        id: OrderId,
    },
    /// The buyer confirmed and the key was settled.
    Confirm {
        seller: Address,
        buyer: Address,
        id: OrderId,
        /// Seller's contribution, paid to the buyer.
        seller_balance: U256,
        /// Buyer's contribution minus the fee, paid to the seller.
        net_buyer_balance: U256,
        /// Platform fee, paid to the deposit address.
        fee: U256,
    },
    /// Attached value forwarded straight to `recipient`.
    InstantPay {
        sender: Address,
        recipient: Address,
        amount: U256,
    },
    /// The founder changed the global fee rate.
    FeeChanged { old_rate: U256, new_rate: U256 },
}

impl LedgerEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Order { .. } => EventKind::Order,
            Self::Withdraw { .. } => EventKind::Withdraw,
            Self::Unlock { .. } => EventKind::Unlock,
            Self::Confirm { .. } => EventKind::Confirm,
            Self::InstantPay { .. } => EventKind::InstantPay,
            Self::FeeChanged { .. } => EventKind::FeeChanged,
        }
    }

    /// The order id this event concerns, if any.
    #[must_use]
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Order { id, .. }
            | Self::Withdraw { id, .. }
            | Self::Unlock { id, .. }
            | Self::Confirm { id, .. } => Some(*id),
            Self::InstantPay { .. } | Self::FeeChanged { .. } => None,
        }
    }
}
