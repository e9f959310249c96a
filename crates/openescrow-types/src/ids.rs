//! Identifiers used throughout OpenEscrow.
//!
//! Parties are 20-byte ledger addresses. Order ids are caller-chosen 256-bit
//! integers; they only correlate one seller with one buyer, so the full
//! escrow key is always the triple `(id, seller, buyer)`.

use std::fmt;

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{EscrowError, Result};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte ledger address identifying a party, the founder, or the fee
/// deposit account.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address. Never a valid caller or payout destination.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a hex address, with or without a `0x` prefix.
    ///
    /// # Errors
    /// Returns `InvalidAddress` if the input is not 20 bytes of valid hex.
    pub fn from_hex(s: &str) -> Result<Self> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| EscrowError::InvalidAddress)?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| EscrowError::InvalidAddress)?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns `true` for the null address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Abbreviated form for log lines: `0x1234abcd`.
    #[must_use]
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Deterministic and random addresses for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// An address whose last byte is `n` (all other bytes zero).
    #[must_use]
    pub fn dummy(n: u8) -> Self {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Self(bytes)
    }

    /// A random non-zero address.
    #[must_use]
    pub fn random() -> Self {
        loop {
            let addr = Self(rand::random::<[u8; 20]>());
            if !addr.is_zero() {
                return addr;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Caller-chosen 256-bit order identifier.
///
/// The ledger never allocates ids. Different seller/buyer pairs may reuse
/// the same id without colliding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct OrderId(pub U256);

impl OrderId {
    #[must_use]
    pub fn new(value: U256) -> Self {
        Self(value)
    }

    /// Deterministic `OrderId` from an off-ledger reference string
    /// (an invoice number, a marketplace listing key, ...).
    ///
    /// Both parties derive the **same** id from the same reference without
    /// coordinating, which is all the ledger needs from a correlation key.
    #[must_use]
    pub fn from_reference(reference: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"openescrow:order_id:v1:");
        hasher.update(reference.as_bytes());
        let hash = hasher.finalize();
        Self(U256::from_big_endian(&hash))
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "order:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EscrowKey
// ---------------------------------------------------------------------------

/// The `(id, seller, buyer)` triple that keys escrow balances and lock flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EscrowKey {
    pub id: OrderId,
    pub seller: Address,
    pub buyer: Address,
}

impl EscrowKey {
    #[must_use]
    pub fn new(id: OrderId, seller: Address, buyer: Address) -> Self {
        Self { id, seller, buyer }
    }

    /// Whether `party` is the seller or the buyer of this key.
    #[must_use]
    pub fn is_party(&self, party: Address) -> bool {
        party == self.seller || party == self.buyer
    }
}

impl fmt::Display for EscrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seller={} buyer={}",
            self.id,
            self.seller.short(),
            self.buyer.short()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::dummy(1).is_zero());
        assert!(!Address::random().is_zero());
    }

    #[test]
    fn address_hex_parsing() {
        let addr = Address::from_hex("0x00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(addr, Address::dummy(0xff));

        let bare = Address::from_hex("00000000000000000000000000000000000000ff").unwrap();
        assert_eq!(addr, bare);
        assert_eq!(format!("{addr}"), "0x00000000000000000000000000000000000000ff");
    }

    #[test]
    fn address_from_raw_bytes() {
        let mut bytes = [0u8; 20];
        bytes[0] = 0xab;
        bytes[19] = 0x01;
        let addr = Address::new(bytes);
        assert_eq!(addr.as_bytes(), &bytes);
        assert_eq!(addr.short(), "0xab000000");
        assert_eq!(Address::new(*Address::dummy(9).as_bytes()), Address::dummy(9));
    }

    #[test]
    fn address_hex_rejects_bad_input() {
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(EscrowError::InvalidAddress)
        ));
        assert!(matches!(
            Address::from_hex("not hex at all"),
            Err(EscrowError::InvalidAddress)
        ));
    }

    #[test]
    fn order_id_from_reference_is_deterministic() {
        let a = OrderId::from_reference("invoice-2041");
        let b = OrderId::from_reference("invoice-2041");
        assert_eq!(a, b);
        assert_ne!(a, OrderId::from_reference("invoice-2042"));
    }

    #[test]
    fn order_id_constructors_agree() {
        assert_eq!(OrderId::new(U256::from(42)), OrderId::from(42));
        assert_eq!(OrderId::new(U256::MAX).0, U256::MAX);
    }

    #[test]
    fn escrow_key_parties() {
        let seller = Address::dummy(1);
        let buyer = Address::dummy(2);
        let key = EscrowKey::new(OrderId::from(7), seller, buyer);
        assert!(key.is_party(seller));
        assert!(key.is_party(buyer));
        assert!(!key.is_party(Address::dummy(3)));
    }

    #[test]
    fn same_id_different_pairs_are_distinct_keys() {
        let id = OrderId::from(1);
        let a = EscrowKey::new(id, Address::dummy(1), Address::dummy(2));
        let b = EscrowKey::new(id, Address::dummy(1), Address::dummy(3));
        assert_ne!(a, b);
    }

    #[test]
    fn serde_roundtrips() {
        let key = EscrowKey::new(
            OrderId::from_reference("listing-9"),
            Address::random(),
            Address::random(),
        );
        let json = serde_json::to_string(&key).unwrap();
        let back: EscrowKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
