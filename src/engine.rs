//! Core ledger engine.
//!
//! Enforces the deposit, withdrawal, and transfer rules against in-memory
//! accounts, stamping every recorded transaction with a fresh reference
//! drawn against the durable store. Deposits and withdrawals stay
//! in-memory until session reconciliation; transfers are committed to the
//! store immediately because the credited account is not part of the
//! session.
//!
//! Every funds-related failure leaves balances and histories exactly as
//! they were: no transaction is recorded for a failed attempt.

use crate::account::Account;
use crate::error::{Result, TellerError};
use crate::ident::IdGenerator;
use crate::money::Money;
use crate::store::Store;
use crate::transaction::{Transaction, TxKind};
use log::{debug, warn};

/// The ledger engine, generic over the durable store behind it.
pub struct Ledger<S: Store> {
    store: S,
    idgen: IdGenerator,
}

impl<S: Store> Ledger<S> {
    /// Creates a ledger over `store` with the default identifier
    /// generator.
    pub fn new(store: S) -> Self {
        Ledger {
            store,
            idgen: IdGenerator::default(),
        }
    }

    /// Creates a ledger with an explicit attempt ceiling on identifier
    /// generation.
    pub fn with_generator(store: S, idgen: IdGenerator) -> Self {
        Ledger { store, idgen }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Non-mutating balance query.
    pub fn balance(&self, account: &Account) -> Money {
        account.balance
    }

    /// Opens a new account with a freshly assigned account number and
    /// zero balance, persisted immediately so it is a valid transfer
    /// target from other sessions.
    pub fn open_account(
        &mut self,
        username: &str,
        secret_hash: &str,
        display_name: &str,
    ) -> Result<Account> {
        let number = {
            let store = &self.store;
            self.idgen
                .account_number(|candidate| store.account_number_exists(candidate))?
        };

        let account = Account::new(
            username.to_string(),
            secret_hash.to_string(),
            display_name.to_string(),
            number,
        );
        self.store.upsert_account(&account)?;

        debug!(
            "Opened account {} for username {}",
            account.account_number, account.username
        );
        Ok(account)
    }

    /// Credits `amount` to the account and records a `deposit`
    /// transaction. Never fails for funds reasons; rejects non-positive
    /// amounts with [`TellerError::InvalidAmount`].
    ///
    /// Returns the stamped reference.
    pub fn deposit(&mut self, account: &mut Account, amount: Money) -> Result<String> {
        require_positive(amount)?;

        let reference = self.fresh_reference(&account.transactions)?;
        let tx = Transaction::new(
            reference.clone(),
            account.account_number.clone(),
            amount,
            TxKind::Deposit,
        );
        account.credit(tx);

        debug!("Deposited {} to {}", amount, account.account_number);
        Ok(reference)
    }

    /// Debits `amount` from the account and records a `withdrawal`
    /// transaction.
    ///
    /// Succeeds iff `amount <= balance`: withdrawing the exact balance is
    /// allowed and leaves it at zero. On failure nothing changes and no
    /// transaction is recorded.
    pub fn withdraw(&mut self, account: &mut Account, amount: Money) -> Result<String> {
        require_positive(amount)?;

        if amount > account.balance {
            warn!(
                "Withdrawal of {} from {} refused: balance {}",
                amount, account.account_number, account.balance
            );
            return Err(TellerError::InsufficientFunds {
                requested: amount,
                available: account.balance,
            });
        }

        let reference = self.fresh_reference(&account.transactions)?;
        let tx = Transaction::new(
            reference.clone(),
            account.account_number.clone(),
            amount,
            TxKind::Withdrawal,
        );
        account.debit(tx);

        debug!("Withdrew {} from {}", amount, account.account_number);
        Ok(reference)
    }

    /// Moves `amount` from `source` to the account holding
    /// `destination_number`.
    ///
    /// The destination must already exist ([`TellerError::DestinationNotFound`]
    /// otherwise; a transfer never creates its target). The debit and
    /// credit legs share one operation reference with `-out` / `-in`
    /// suffixes and are committed to the store as a single atomic unit
    /// together with both balance updates. Because the source balance may
    /// carry unflushed session mutations, the commit snapshots the whole
    /// source account — row and full history — so the durable copy stays
    /// balanced even if the process dies before reconciliation. If the
    /// commit fails, the in-memory source account is left untouched.
    ///
    /// Returns the shared operation reference.
    pub fn transfer(
        &mut self,
        source: &mut Account,
        amount: Money,
        destination_number: &str,
    ) -> Result<String> {
        require_positive(amount)?;

        if destination_number == source.account_number {
            return Err(TellerError::InvalidAmount(
                "cannot transfer to the same account".to_string(),
            ));
        }

        if amount > source.balance {
            return Err(TellerError::InsufficientFunds {
                requested: amount,
                available: source.balance,
            });
        }

        let mut destination = self
            .store
            .find_by_account_number(destination_number)?
            .ok_or_else(|| TellerError::DestinationNotFound(destination_number.to_string()))?;

        // One generated reference correlates the pair; the suffixed leg
        // references stay unique as long as the base is.
        let operation = {
            let store = &self.store;
            self.idgen.reference(|candidate| {
                Ok(store.reference_exists(candidate)?
                    || store.reference_exists(&format!("{candidate}-out"))?
                    || store.reference_exists(&format!("{candidate}-in"))?)
            })?
        };

        let out_leg = Transaction::new(
            format!("{operation}-out"),
            source.account_number.clone(),
            amount,
            TxKind::TransferOut,
        );
        let in_leg = Transaction::new(
            format!("{operation}-in"),
            destination.account_number.clone(),
            amount,
            TxKind::TransferIn,
        );

        // Stage the debit on a copy so a failed commit leaves the live
        // session account unchanged.
        let mut staged = source.clone();
        staged.debit(out_leg);
        destination.credit(in_leg.clone());

        self.store
            .commit_transfer(&staged, &destination, &in_leg)?;
        *source = staged;

        debug!(
            "Transferred {} from {} to {} ({})",
            amount, source.account_number, destination_number, operation
        );
        Ok(operation)
    }

    /// Draws a reference that is free in the store and absent from the
    /// still-unflushed in-memory history.
    fn fresh_reference(&self, history: &[Transaction]) -> Result<String> {
        let store = &self.store;
        self.idgen.reference(|candidate| {
            Ok(store.reference_exists(candidate)?
                || history.iter().any(|tx| tx.reference == candidate))
        })
    }
}

fn require_positive(amount: Money) -> Result<()> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(TellerError::InvalidAmount(amount.to_string()))
    }
}
