//! Per-call context supplied by the hosting environment.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::Address;

/// The authenticated caller of one ledger operation and the native value
/// attached to the call.
///
/// The ledger never infers identity from ambient state; every operation
/// takes the context explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: U256,
}

impl CallContext {
    /// A call with value attached.
    #[must_use]
    pub fn new(caller: Address, value: U256) -> Self {
        Self { caller, value }
    }

    /// A call with no value attached.
    #[must_use]
    pub fn from_caller(caller: Address) -> Self {
        Self {
            caller,
            value: U256::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_caller_attaches_nothing() {
        let ctx = CallContext::from_caller(Address::dummy(3));
        assert_eq!(ctx.caller, Address::dummy(3));
        assert!(ctx.value.is_zero());
    }
}
