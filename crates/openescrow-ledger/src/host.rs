//! In-memory hosting environment.
//!
//! [`MemoryHost`] plays the part of the execution environment around an
//! [`EscrowLedger`]: it keeps native balances, moves the attached value into
//! the ledger's account for each call (and back out if the call aborts),
//! and delivers outbound transfers. Accounts can register a [`Recipient`]
//! that runs when they are paid; it may refuse the payment or call back
//! into the ledger.
//!
//! A recipient is not re-entered while its own payment hook is running:
//! nested payments to the same account are plain credits.

use std::collections::HashMap;

use openescrow_types::{Address, CallContext, EscrowError, Result, U256};

use crate::{EscrowLedger, EscrowStore, MemoryStore, SolvencyCheck, ValueTransfer};

/// Code that runs when an account receives a payment from the ledger.
pub trait Recipient {
    /// Called after `amount` has been credited. Returning `false` refuses
    /// the payment: the credit and everything done here are undone.
    fn on_payment(&mut self, ledger: &mut EscrowLedger, host: &mut MemoryHost, amount: U256)
    -> bool;
}

impl<F> Recipient for F
where
    F: FnMut(&mut EscrowLedger, &mut MemoryHost, U256) -> bool,
{
    fn on_payment(
        &mut self,
        ledger: &mut EscrowLedger,
        host: &mut MemoryHost,
        amount: U256,
    ) -> bool {
        self(ledger, host, amount)
    }
}

/// A recipient that refuses every payment.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefusePayments;

impl Recipient for RefusePayments {
    fn on_payment(&mut self, _: &mut EscrowLedger, _: &mut MemoryHost, _: U256) -> bool {
        false
    }
}

/// Everything a refused payment or aborted call must restore.
#[derive(Debug, Clone, Default)]
struct HostState {
    balances: HashMap<Address, U256>,
    flows: SolvencyCheck,
}

/// Native balances plus payment hooks for one ledger account.
pub struct MemoryHost {
    ledger_account: Address,
    state: HostState,
    recipients: HashMap<Address, Box<dyn Recipient>>,
}

impl MemoryHost {
    /// Create a host whose ledger lives at `ledger_account`.
    #[must_use]
    pub fn new(ledger_account: Address) -> Self {
        Self {
            ledger_account,
            state: HostState::default(),
            recipients: HashMap::new(),
        }
    }

    /// Credit `amount` of fresh native currency to `account`.
    pub fn fund(&mut self, account: Address, amount: U256) {
        let balance = self.balance_of(account).saturating_add(amount);
        self.state.balances.insert(account, balance);
    }

    #[must_use]
    pub fn balance_of(&self, account: Address) -> U256 {
        self.state
            .balances
            .get(&account)
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn ledger_account(&self) -> Address {
        self.ledger_account
    }

    /// Native currency held by the ledger's account.
    #[must_use]
    pub fn holdings(&self) -> U256 {
        self.balance_of(self.ledger_account)
    }

    /// Recorded value flows of the ledger's account.
    #[must_use]
    pub fn flows(&self) -> &SolvencyCheck {
        &self.state.flows
    }

    /// Install payment hook code for `account`.
    pub fn set_recipient(&mut self, account: Address, recipient: Box<dyn Recipient>) {
        self.recipients.insert(account, recipient);
    }

    pub fn remove_recipient(&mut self, account: Address) {
        self.recipients.remove(&account);
    }

    /// Check the ledger's holdings against the recorded flows and the
    /// escrowed total. Returns the stranded surplus.
    pub fn audit<S: EscrowStore>(&self, ledger: &EscrowLedger<S>) -> Result<U256> {
        self.state
            .flows
            .verify(self.holdings(), ledger.store().total_escrowed())
    }

    /// Execute one ledger call from `caller` with `value` attached.
    ///
    /// The value moves into the ledger's account before `op` runs. If `op`
    /// fails, every balance change made during the call is undone.
    ///
    /// # Errors
    /// - `TransferFailed` if `caller` cannot cover `value`
    /// - whatever `op` returns
    pub fn call<R>(
        &mut self,
        ledger: &mut EscrowLedger,
        caller: Address,
        value: U256,
        op: impl FnOnce(&mut EscrowLedger, &mut Self, &CallContext) -> Result<R>,
    ) -> Result<R> {
        let snapshot = self.state.clone();
        if !self.move_value(caller, self.ledger_account, value) {
            return Err(EscrowError::transfer_failed(format!(
                "{caller} cannot attach {value}"
            )));
        }
        self.state.flows.record_inflow(value);

        let ctx = CallContext::new(caller, value);
        let result = op(ledger, self, &ctx);
        if result.is_err() {
            self.state = snapshot;
        }
        result
    }

    fn move_value(&mut self, from: Address, to: Address, amount: U256) -> bool {
        let from_balance = self.balance_of(from);
        let Some(remaining) = from_balance.checked_sub(amount) else {
            return false;
        };
        self.state.balances.insert(from, remaining);
        self.fund(to, amount);
        true
    }
}

impl ValueTransfer<MemoryStore> for MemoryHost {
    fn transfer(&mut self, ledger: &mut EscrowLedger, to: Address, amount: U256) -> bool {
        let snapshot = self.state.clone();
        if !self.move_value(self.ledger_account, to, amount) {
            tracing::warn!(%to, %amount, holdings = %self.holdings(), "ledger account cannot cover transfer");
            return false;
        }
        self.state.flows.record_outflow(amount);

        let Some(mut recipient) = self.recipients.remove(&to) else {
            return true;
        };

        ledger.begin_frame();
        let accepted = recipient.on_payment(ledger, self, amount);
        self.recipients.entry(to).or_insert(recipient);

        if accepted {
            ledger.commit_frame();
        } else {
            ledger.rollback_frame();
            self.state = snapshot;
            tracing::debug!(%to, %amount, "recipient refused payment");
        }
        accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openescrow_types::{LedgerConfig, OrderId};

    fn setup() -> (EscrowLedger, MemoryHost) {
        let ledger = EscrowLedger::deploy(
            &CallContext::from_caller(Address::dummy(0xf0)),
            &LedgerConfig::new(Address::dummy(0xd0)),
            MemoryStore::new(),
        )
        .unwrap();
        (ledger, MemoryHost::new(Address::dummy(0xee)))
    }

    #[test]
    fn call_moves_attached_value_into_ledger() {
        let (mut ledger, mut host) = setup();
        let buyer = Address::dummy(2);
        host.fund(buyer, U256::from(1_000));

        host.call(&mut ledger, buyer, U256::from(400), |l, _, ctx| {
            l.order(ctx, Address::dummy(1), buyer, OrderId::from(1))
        })
        .unwrap();

        assert_eq!(host.balance_of(buyer), U256::from(600));
        assert_eq!(host.holdings(), U256::from(400));
        assert_eq!(host.audit(&ledger).unwrap(), U256::zero());
    }

    #[test]
    fn aborted_call_refunds_value() {
        let (mut ledger, mut host) = setup();
        let stranger = Address::dummy(3);
        host.fund(stranger, U256::from(1_000));

        let err = host
            .call(&mut ledger, stranger, U256::from(400), |l, _, ctx| {
                l.order(ctx, Address::dummy(1), Address::dummy(2), OrderId::from(1))
            })
            .unwrap_err();

        assert_eq!(err, EscrowError::Unauthorized);
        assert_eq!(host.balance_of(stranger), U256::from(1_000));
        assert!(host.holdings().is_zero());
        assert!(host.flows().total_inflows().is_zero());
    }

    #[test]
    fn call_without_funds_rejected() {
        let (mut ledger, mut host) = setup();
        let err = host
            .call(&mut ledger, Address::dummy(2), U256::from(1), |_, _, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, EscrowError::TransferFailed { .. }));
    }

    #[test]
    fn refusing_recipient_keeps_funds_in_ledger() {
        let (mut ledger, mut host) = setup();
        host.fund(host.ledger_account(), U256::from(50));
        host.set_recipient(Address::dummy(7), Box::new(RefusePayments));

        assert!(!host.transfer(&mut ledger, Address::dummy(7), U256::from(50)));
        assert_eq!(host.holdings(), U256::from(50));
        assert!(host.balance_of(Address::dummy(7)).is_zero());
    }

    #[test]
    fn closure_recipient_sees_amount() {
        let (mut ledger, mut host) = setup();
        host.fund(host.ledger_account(), U256::from(50));
        host.set_recipient(
            Address::dummy(7),
            Box::new(|_: &mut EscrowLedger, _: &mut MemoryHost, amount: U256| {
                amount == U256::from(20)
            }),
        );

        assert!(!host.transfer(&mut ledger, Address::dummy(7), U256::from(10)));
        assert!(host.transfer(&mut ledger, Address::dummy(7), U256::from(20)));
        assert_eq!(host.balance_of(Address::dummy(7)), U256::from(20));
    }

    #[test]
    fn removed_recipient_no_longer_refuses() {
        let (mut ledger, mut host) = setup();
        host.fund(host.ledger_account(), U256::from(30));
        host.set_recipient(Address::dummy(7), Box::new(RefusePayments));
        assert!(!host.transfer(&mut ledger, Address::dummy(7), U256::from(10)));

        host.remove_recipient(Address::dummy(7));
        assert!(host.transfer(&mut ledger, Address::dummy(7), U256::from(10)));
        assert_eq!(host.balance_of(Address::dummy(7)), U256::from(10));
        assert_eq!(host.holdings(), U256::from(20));
    }

    #[test]
    fn transfer_beyond_holdings_fails() {
        let (mut ledger, mut host) = setup();
        assert!(!host.transfer(&mut ledger, Address::dummy(7), U256::from(1)));
        assert!(host.transfer(&mut ledger, Address::dummy(7), U256::zero()));
    }
}
