//! Confirm-time settlement: fee computation and the criss-cross payout plan.
//!
//! When the buyer confirms, whoever put money in gets the counterparty's
//! money out:
//! 1. Buyer's contribution minus the fee → seller
//! 2. Seller's contribution → buyer
//! 3. Fee → deposit address
//!
//! All three legs are attempted. The settlement fails only if none of them
//! is delivered.

use openescrow_types::{constants, Address, EscrowError, EscrowKey, Result, U256};

/// Fee charged on `amount` at `fee_rate`:
/// `amount * 100 * fee_rate / 1_000_000` (so 100 ⇒ 1%, 30 ⇒ 0.3%).
///
/// # Errors
/// Returns `ArithmeticOverflow` if the intermediate product overflows.
pub fn compute_fee(amount: U256, fee_rate: U256) -> Result<U256> {
    amount
        .checked_mul(U256::from(constants::FEE_MULTIPLIER))
        .and_then(|scaled| scaled.checked_mul(fee_rate))
        .map(|product| product / U256::from(constants::FEE_DENOMINATOR))
        .ok_or(EscrowError::ArithmeticOverflow { context: "fee" })
}

/// One of the three confirm payouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutLeg {
    /// Buyer's net contribution, paid to the seller.
    Seller,
    /// Seller's contribution, paid to the buyer.
    Buyer,
    /// Platform fee, paid to the deposit address.
    Fee,
}

impl std::fmt::Display for PayoutLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seller => write!(f, "SELLER"),
            Self::Buyer => write!(f, "BUYER"),
            Self::Fee => write!(f, "FEE"),
        }
    }
}

/// A single outbound transfer of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payout {
    pub leg: PayoutLeg,
    pub to: Address,
    pub amount: U256,
}

/// The computed payouts for one confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementPlan {
    pub key: EscrowKey,
    /// Seller's contribution (paid to the buyer).
    pub seller_balance: U256,
    /// Buyer's contribution minus the fee (paid to the seller).
    pub net_buyer_balance: U256,
    pub fee: U256,
    pub deposit_address: Address,
}

impl SettlementPlan {
    /// Build the plan for `key` from both parties' contributions.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if the fee overflows or exceeds the
    /// buyer's contribution.
    pub fn new(
        key: EscrowKey,
        seller_balance: U256,
        buyer_balance: U256,
        fee_rate: U256,
        deposit_address: Address,
    ) -> Result<Self> {
        let fee = compute_fee(buyer_balance, fee_rate)?;
        let net_buyer_balance = buyer_balance
            .checked_sub(fee)
            .ok_or(EscrowError::ArithmeticOverflow {
                context: "net buyer balance",
            })?;
        Ok(Self {
            key,
            seller_balance,
            net_buyer_balance,
            fee,
            deposit_address,
        })
    }

    /// Payouts in execution order.
    #[must_use]
    pub fn payouts(&self) -> [Payout; 3] {
        [
            Payout {
                leg: PayoutLeg::Seller,
                to: self.key.seller,
                amount: self.net_buyer_balance,
            },
            Payout {
                leg: PayoutLeg::Buyer,
                to: self.key.buyer,
                amount: self.seller_balance,
            },
            Payout {
                leg: PayoutLeg::Fee,
                to: self.deposit_address,
                amount: self.fee,
            },
        ]
    }
}

/// Result of a committed confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub plan: SettlementPlan,
    /// Legs that were refused by the host. Empty for a complete settlement.
    pub failed: Vec<PayoutLeg>,
}

impl Settlement {
    /// Whether every leg was delivered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn delivered(&self, leg: PayoutLeg) -> bool {
        !self.failed.contains(&leg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openescrow_types::OrderId;

    fn key() -> EscrowKey {
        EscrowKey::new(OrderId::from(1), Address::dummy(1), Address::dummy(2))
    }

    #[test]
    fn default_rate_is_one_percent() {
        let fee = compute_fee(U256::from(1_000_000), U256::from(100)).unwrap();
        assert_eq!(fee, U256::from(10_000));
    }

    #[test]
    fn rate_thirty_is_point_three_percent() {
        let fee = compute_fee(U256::from(1_000_000), U256::from(30)).unwrap();
        assert_eq!(fee, U256::from(3_000));
    }

    #[test]
    fn small_amounts_round_down() {
        assert!(compute_fee(U256::from(99), U256::from(100)).unwrap().is_zero());
        assert_eq!(
            compute_fee(U256::from(199), U256::from(100)).unwrap(),
            U256::one()
        );
    }

    #[test]
    fn fee_overflow_detected() {
        let err = compute_fee(U256::MAX, U256::from(100)).unwrap_err();
        assert!(matches!(err, EscrowError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn plan_criss_crosses_contributions() {
        let plan = SettlementPlan::new(
            key(),
            U256::from(500),
            U256::from(1_000_000),
            U256::from(100),
            Address::dummy(9),
        )
        .unwrap();
        assert_eq!(plan.fee, U256::from(10_000));
        assert_eq!(plan.net_buyer_balance, U256::from(990_000));

        let [to_seller, to_buyer, fee] = plan.payouts();
        assert_eq!(to_seller.to, Address::dummy(1));
        assert_eq!(to_seller.amount, U256::from(990_000));
        assert_eq!(to_buyer.to, Address::dummy(2));
        assert_eq!(to_buyer.amount, U256::from(500));
        assert_eq!(fee.to, Address::dummy(9));
        assert_eq!(fee.leg, PayoutLeg::Fee);
    }

    #[test]
    fn fee_above_contribution_underflows() {
        // 100 * 10_001 / 1_000_000 of the contribution > 100%.
        let err = SettlementPlan::new(
            key(),
            U256::zero(),
            U256::from(1_000_000),
            U256::from(10_001),
            Address::dummy(9),
        )
        .unwrap_err();
        assert!(matches!(err, EscrowError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn settlement_completeness() {
        let plan = SettlementPlan::new(
            key(),
            U256::zero(),
            U256::from(100),
            U256::from(100),
            Address::dummy(9),
        )
        .unwrap();
        let partial = Settlement {
            plan,
            failed: vec![PayoutLeg::Fee],
        };
        assert!(!partial.is_complete());
        assert!(partial.delivered(PayoutLeg::Seller));
        assert!(!partial.delivered(PayoutLeg::Fee));
    }
}
