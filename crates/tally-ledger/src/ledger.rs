//! In-memory ledger.
//!
//! Holds per-beneficiary balances and a journal of every applied transfer.
//! Destinations can be marked unreachable to exercise failure paths.
//!
//! [`Ledger::transaction`] opens a [`LedgerTxn`] that stages transfers and
//! applies them together on [`LedgerTxn::commit`]. Dropping the transaction
//! without committing discards everything it staged.

use std::collections::{BTreeMap, BTreeSet};

use tally_types::{Amount, Beneficiary};

use crate::{Result, Transfer, TransferError, ValueTransfer};

/// In-memory balances and transfer journal.
#[derive(Debug, Default)]
pub struct Ledger {
    balances: BTreeMap<Beneficiary, Amount>,
    journal: Vec<Transfer>,
    unreachable: BTreeSet<Beneficiary>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future transfer to `who` fail with
    /// [`TransferError::Unreachable`].
    pub fn mark_unreachable(&mut self, who: Beneficiary) {
        self.unreachable.insert(who);
    }

    /// Undo [`Ledger::mark_unreachable`].
    pub fn mark_reachable(&mut self, who: &Beneficiary) {
        self.unreachable.remove(who);
    }

    /// Current balance of `who`.
    pub fn balance_of(&self, who: &Beneficiary) -> Amount {
        self.balances.get(who).copied().unwrap_or(0)
    }

    /// Sum of all balances.
    pub fn total_credited(&self) -> u128 {
        self.balances.values().map(|b| u128::from(*b)).sum()
    }

    /// Every applied transfer, in order.
    pub fn journal(&self) -> &[Transfer] {
        &self.journal
    }

    /// Open a staged transaction against this ledger.
    pub fn transaction(&mut self) -> LedgerTxn<'_> {
        LedgerTxn {
            ledger: self,
            staged: Vec::new(),
        }
    }

    /// Validate a transfer, given credits already pending for the same
    /// destination.
    fn check(&self, to: &Beneficiary, amount: Amount, pending: Amount) -> Result<()> {
        if self.unreachable.contains(to) {
            return Err(TransferError::Unreachable(*to));
        }
        self.balance_of(to)
            .checked_add(pending)
            .and_then(|b| b.checked_add(amount))
            .ok_or(TransferError::Overflow)?;
        Ok(())
    }

    /// Apply a transfer that has already been checked.
    fn apply(&mut self, transfer: Transfer) {
        let balance = self.balances.entry(transfer.to).or_insert(0);
        *balance = balance.saturating_add(transfer.amount);
        self.journal.push(transfer);
    }
}

impl ValueTransfer for Ledger {
    fn transfer(&mut self, to: &Beneficiary, amount: Amount) -> Result<()> {
        self.check(to, amount, 0)?;
        self.apply(Transfer { to: *to, amount });
        tracing::trace!(to = %to.short(), amount, "ledger: transfer applied");
        Ok(())
    }
}

/// A staged set of transfers that applies all-or-nothing.
#[derive(Debug)]
pub struct LedgerTxn<'a> {
    ledger: &'a mut Ledger,
    staged: Vec<Transfer>,
}

impl LedgerTxn<'_> {
    /// Transfers staged so far.
    pub fn staged(&self) -> &[Transfer] {
        &self.staged
    }

    /// Apply every staged transfer to the ledger.
    ///
    /// Returns the number of transfers applied.
    pub fn commit(self) -> usize {
        let count = self.staged.len();
        for transfer in self.staged {
            self.ledger.apply(transfer);
        }
        tracing::debug!(count, "ledger: transaction committed");
        count
    }

    /// Discard every staged transfer.
    pub fn rollback(self) {
        tracing::debug!(count = self.staged.len(), "ledger: transaction rolled back");
    }

    fn pending_for(&self, to: &Beneficiary) -> Amount {
        self.staged
            .iter()
            .filter(|t| &t.to == to)
            .fold(0u64, |acc, t| acc.saturating_add(t.amount))
    }
}

impl ValueTransfer for LedgerTxn<'_> {
    fn transfer(&mut self, to: &Beneficiary, amount: Amount) -> Result<()> {
        let pending = self.pending_for(to);
        self.ledger.check(to, amount, pending)?;
        self.staged.push(Transfer { to: *to, amount });
        tracing::trace!(to = %to.short(), amount, "ledger: transfer staged");
        Ok(())
    }
}
