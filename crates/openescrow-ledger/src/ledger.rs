//! The escrow ledger: two-party escrow state machine.
//!
//! Every mutating operation runs inside its own store transaction frame:
//! 1. Check authorization and lock-state preconditions (no writes yet)
//! 2. Apply state changes, zeroing anything about to be paid out
//! 3. Issue outbound transfers through the host's [`ValueTransfer`]
//! 4. Emit exactly one [`LedgerEvent`] and commit
//!
//! Any error rolls back the frame: store writes and events staged by the
//! call (and by re-entrant calls nested in it) disappear.

use openescrow_types::{
    constants, Address, CallContext, EscrowError, EscrowKey, LedgerConfig, LedgerEvent, LockState, OrderId,
    Result, U256,
};

use crate::settlement::{compute_fee, Settlement, SettlementPlan};
use crate::store::{EscrowStore, MemoryStore};
use crate::transfer::ValueTransfer;

/// Escrow ledger over an injected store.
pub struct EscrowLedger<S: EscrowStore = MemoryStore> {
    store: S,
    /// Deploying caller; the only identity allowed to change the fee.
    founder: Address,
    /// Destination of settlement fees.
    deposit_address: Address,
    /// Committed notifications, oldest first.
    events: Vec<LedgerEvent>,
    /// Event-log length at each open frame.
    event_marks: Vec<usize>,
}

impl<S: EscrowStore> EscrowLedger<S> {
    /// Deploy a ledger. The deploying caller becomes the founder.
    ///
    /// # Errors
    /// - `InvalidAddress` if the deployer is the zero address
    /// - `Configuration` if `config` is invalid
    pub fn deploy(ctx: &CallContext, config: &LedgerConfig, mut store: S) -> Result<Self> {
        if ctx.caller.is_zero() {
            return Err(EscrowError::InvalidAddress);
        }
        config.validate()?;
        store.set_fee_rate(config.initial_fee_rate);

        tracing::info!(
            ledger = constants::LEDGER_NAME,
            version = constants::VERSION,
            founder = %ctx.caller,
            deposit_address = %config.deposit_address,
            fee_rate = %config.initial_fee_rate,
            "escrow ledger deployed"
        );

        Ok(Self {
            store,
            founder: ctx.caller,
            deposit_address: config.deposit_address,
            events: Vec::new(),
            event_marks: Vec::new(),
        })
    }

    // =================================================================
    // Escrow operations
    // =================================================================

    /// Deposit the attached value against `(id, seller, buyer)`.
    ///
    /// The caller's contribution is **overwritten** with the attached value
    /// while the escrow balance accumulates. A seller deposit locks the key.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is neither seller nor buyer
    /// - `WrongLockState` if the key is locked
    /// - `ArithmeticOverflow` if the escrow balance would overflow
    pub fn order(
        &mut self,
        ctx: &CallContext,
        seller: Address,
        buyer: Address,
        id: OrderId,
    ) -> Result<bool> {
        let key = EscrowKey::new(id, seller, buyer);
        self.begin_frame();
        let result = self.try_order(ctx, key);
        self.finish_frame("order", result)
    }

    fn try_order(&mut self, ctx: &CallContext, key: EscrowKey) -> Result<bool> {
        if !key.is_party(ctx.caller) {
            return Err(EscrowError::Unauthorized);
        }
        self.store.lock_state(&key).require_unlocked()?;

        let escrow = self
            .store
            .escrow(&key)
            .checked_add(ctx.value)
            .ok_or(EscrowError::ArithmeticOverflow { context: "escrow" })?;
        self.store.set_escrow(key, escrow);
        self.store.set_contribution(key.id, ctx.caller, ctx.value);

        if ctx.caller == key.seller {
            self.store.set_lock_state(key, LockState::Locked);
        }

        self.emit(LedgerEvent::Order {
            seller: key.seller,
            buyer: key.buyer,
            id: key.id,
            amount: ctx.value,
        });
        tracing::info!(%key, caller = %ctx.caller, amount = %ctx.value, %escrow, "order deposited");
        Ok(true)
    }

    /// Buyer confirms the trade: settle both contributions criss-cross and
    /// collect the fee.
    ///
    /// Both contributions and the escrow balance are zeroed before any
    /// transfer is attempted. The three payouts are attempted
    /// unconditionally; the call fails only if **all** of them fail.
    ///
    /// When seller and buyer are the same address both contribution reads
    /// hit one slot, so the deposit is paid out on both legs.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is not the buyer
    /// - `WrongLockState` if the key is unlocked
    /// - `InvalidAmount` if the buyer has no contribution
    /// - `ArithmeticOverflow` if the fee overflows or exceeds the contribution
    /// - `TransferFailed` if no payout was delivered
    pub fn confirm<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        seller: Address,
        buyer: Address,
        id: OrderId,
    ) -> Result<Settlement> {
        let key = EscrowKey::new(id, seller, buyer);
        self.begin_frame();
        let result = self.try_confirm(ctx, host, key);
        self.finish_frame("confirm", result)
    }

    fn try_confirm<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        key: EscrowKey,
    ) -> Result<Settlement> {
        if ctx.caller != key.buyer {
            return Err(EscrowError::Unauthorized);
        }
        self.store.lock_state(&key).require_locked()?;

        let buyer_balance = self.store.contribution(key.id, key.buyer);
        if buyer_balance.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }
        let seller_balance = self.store.contribution(key.id, key.seller);

        self.store.set_contribution(key.id, key.buyer, U256::zero());
        self.store.set_contribution(key.id, key.seller, U256::zero());
        self.store.set_escrow(key, U256::zero());

        let plan = SettlementPlan::new(
            key,
            seller_balance,
            buyer_balance,
            self.store.fee_rate(),
            self.deposit_address,
        )?;

        let mut failed = Vec::new();
        for payout in plan.payouts() {
            if !host.transfer(self, payout.to, payout.amount) {
                tracing::warn!(%key, leg = %payout.leg, to = %payout.to, amount = %payout.amount, "settlement payout refused");
                failed.push(payout.leg);
            }
        }
        if failed.len() == plan.payouts().len() {
            return Err(EscrowError::transfer_failed(format!(
                "all settlement payouts refused for {key}"
            )));
        }

        self.emit(LedgerEvent::Confirm {
            seller: key.seller,
            buyer: key.buyer,
            id: key.id,
            seller_balance: plan.seller_balance,
            net_buyer_balance: plan.net_buyer_balance,
            fee: plan.fee,
        });
        let settlement = Settlement { plan, failed };
        if settlement.is_complete() {
            tracing::info!(%key, seller_balance = %plan.seller_balance, net_buyer_balance = %plan.net_buyer_balance, fee = %plan.fee, "order settled");
        } else {
            tracing::warn!(%key, failed = ?settlement.failed, "order settled partially");
        }
        Ok(settlement)
    }

    /// Take back the caller's contribution from an unlocked key.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is neither seller nor buyer
    /// - `WrongLockState` if the key is locked
    /// - `InvalidAmount` if the caller has no contribution
    /// - `ArithmeticOverflow` if the contribution exceeds the escrow balance
    /// - `TransferFailed` if the refund was refused
    pub fn withdraw<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        seller: Address,
        buyer: Address,
        id: OrderId,
    ) -> Result<U256> {
        let key = EscrowKey::new(id, seller, buyer);
        self.begin_frame();
        let result = self.try_withdraw(ctx, host, key);
        self.finish_frame("withdraw", result)
    }

    fn try_withdraw<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        key: EscrowKey,
    ) -> Result<U256> {
        if !key.is_party(ctx.caller) {
            return Err(EscrowError::Unauthorized);
        }
        self.store.lock_state(&key).require_unlocked()?;

        let amount = self.store.contribution(key.id, ctx.caller);
        if amount.is_zero() {
            return Err(EscrowError::InvalidAmount);
        }

        self.store.set_contribution(key.id, ctx.caller, U256::zero());
        let escrow = self
            .store
            .escrow(&key)
            .checked_sub(amount)
            .ok_or(EscrowError::ArithmeticOverflow { context: "escrow" })?;
        self.store.set_escrow(key, escrow);

        if !host.transfer(self, ctx.caller, amount) {
            return Err(EscrowError::transfer_failed(format!(
                "refund of {amount} to {} refused",
                ctx.caller
            )));
        }

        self.emit(LedgerEvent::Withdraw {
            seller: key.seller,
            buyer: key.buyer,
            id: key.id,
            amount,
        });
        tracing::info!(%key, caller = %ctx.caller, %amount, "contribution withdrawn");
        Ok(amount)
    }

    /// Seller releases the lock. No funds move.
    ///
    /// # Errors
    /// - `Unauthorized` if the caller is not the seller
    /// - `WrongLockState` if the key is not locked
    pub fn unlock(
        &mut self,
        ctx: &CallContext,
        seller: Address,
        buyer: Address,
        id: OrderId,
    ) -> Result<()> {
        let key = EscrowKey::new(id, seller, buyer);
        self.begin_frame();
        let result = self.try_unlock(ctx, key);
        self.finish_frame("unlock", result)
    }

    fn try_unlock(&mut self, ctx: &CallContext, key: EscrowKey) -> Result<()> {
        if ctx.caller != key.seller {
            return Err(EscrowError::Unauthorized);
        }
        self.store.lock_state(&key).require_locked()?;
        self.store.set_lock_state(key, LockState::Unlocked);

        self.emit(LedgerEvent::Unlock {
            seller: key.seller,
            buyer: key.buyer,
            id: key.id,
        });
        tracing::info!(%key, "order unlocked");
        Ok(())
    }

    // =================================================================
    // Administration and pass-through payments
    // =================================================================

    /// Founder overwrites the global fee rate. The rate is not bounded.
    ///
    /// # Errors
    /// - `InvalidAddress` if the caller is the zero address
    /// - `Unauthorized` if the caller is not the founder
    pub fn change_fee(&mut self, ctx: &CallContext, new_fee: U256) -> Result<()> {
        self.begin_frame();
        let result = self.try_change_fee(ctx, new_fee);
        self.finish_frame("change_fee", result)
    }

    fn try_change_fee(&mut self, ctx: &CallContext, new_fee: U256) -> Result<()> {
        if ctx.caller.is_zero() {
            return Err(EscrowError::InvalidAddress);
        }
        if ctx.caller != self.founder {
            return Err(EscrowError::Unauthorized);
        }
        let old_rate = self.store.fee_rate();
        self.store.set_fee_rate(new_fee);

        self.emit(LedgerEvent::FeeChanged {
            old_rate,
            new_rate: new_fee,
        });
        tracing::info!(%old_rate, new_rate = %new_fee, "fee rate changed");
        Ok(())
    }

    /// Forward the attached value to `recipient`.
    ///
    /// # Errors
    /// - `InvalidAddress` if `recipient` is the zero address
    /// - `TransferFailed` if the payment was refused
    pub fn instant_pay<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        recipient: Address,
    ) -> Result<()> {
        self.begin_frame();
        let result = self.try_instant_pay(ctx, host, recipient);
        self.finish_frame("instant_pay", result)
    }

    fn try_instant_pay<T: ValueTransfer<S> + ?Sized>(
        &mut self,
        ctx: &CallContext,
        host: &mut T,
        recipient: Address,
    ) -> Result<()> {
        if recipient.is_zero() {
            return Err(EscrowError::InvalidAddress);
        }
        if !host.transfer(self, recipient, ctx.value) {
            return Err(EscrowError::transfer_failed(format!(
                "instant payment to {recipient} refused"
            )));
        }

        self.emit(LedgerEvent::InstantPay {
            sender: ctx.caller,
            recipient,
            amount: ctx.value,
        });
        tracing::info!(sender = %ctx.caller, %recipient, amount = %ctx.value, "instant payment forwarded");
        Ok(())
    }

    // =================================================================
    // Read accessors
    // =================================================================

    /// Total held for `(id, seller, buyer)`.
    #[must_use]
    pub fn escrow_of(&self, seller: Address, buyer: Address, id: OrderId) -> U256 {
        self.store.escrow(&EscrowKey::new(id, seller, buyer))
    }

    /// Whether `(id, seller, buyer)` is locked.
    #[must_use]
    pub fn locked_of(&self, seller: Address, buyer: Address, id: OrderId) -> bool {
        self.store
            .lock_state(&EscrowKey::new(id, seller, buyer))
            .is_locked()
    }

    /// Amount `party` deposited under `id`.
    #[must_use]
    pub fn contribution_of(&self, id: OrderId, party: Address) -> U256 {
        self.store.contribution(id, party)
    }

    #[must_use]
    pub fn founder(&self) -> Address {
        self.founder
    }

    #[must_use]
    pub fn deposit_address(&self) -> Address {
        self.deposit_address
    }

    #[must_use]
    pub fn fee_rate(&self) -> U256 {
        self.store.fee_rate()
    }

    /// Fee a confirm would charge on a buyer contribution of `amount` at
    /// the current rate.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if the fee computation overflows.
    pub fn fee_for(&self, amount: U256) -> Result<U256> {
        compute_fee(amount, self.store.fee_rate())
    }

    /// Committed notifications, oldest first.
    #[must_use]
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Take all committed notifications. Not allowed mid-call.
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        if self.event_marks.is_empty() {
            std::mem::take(&mut self.events)
        } else {
            Vec::new()
        }
    }

    /// Read-only access to the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // =================================================================
    // Transaction frames
    // =================================================================

    /// Open a transaction frame covering store writes and events.
    ///
    /// Every operation opens its own frame. Hosts open one around a
    /// recipient's code so a refused payment can discard whatever the
    /// recipient did to the ledger.
    pub fn begin_frame(&mut self) {
        self.store.begin();
        self.event_marks.push(self.events.len());
    }

    /// Keep everything written since the matching [`Self::begin_frame`].
    pub fn commit_frame(&mut self) {
        self.store.commit();
        self.event_marks.pop();
    }

    /// Discard everything written since the matching [`Self::begin_frame`].
    pub fn rollback_frame(&mut self) {
        self.store.rollback();
        if let Some(mark) = self.event_marks.pop() {
            self.events.truncate(mark);
        }
    }

    fn finish_frame<R>(&mut self, op: &'static str, result: Result<R>) -> Result<R> {
        match &result {
            Ok(_) => self.commit_frame(),
            Err(err) => {
                self.rollback_frame();
                tracing::debug!(op, error = %err, "call aborted, state rolled back");
            }
        }
        result
    }

    fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }
}
