//! Customer account model.
//!
//! Maintains the conservation invariant: balance equals the signed sum of
//! all recorded transactions, absent an externally loaded starting balance.

use crate::money::Money;
use crate::transaction::Transaction;

/// A customer's identity, balance, and owned transaction history.
///
/// # Invariants
///
/// - `balance` is never negative: the ledger rejects any debit that would
///   overdraw it before mutating anything
/// - `transactions` is append-only and ordered; insertion order is
///   chronological
/// - `account_number` is immutable once assigned
///
/// Accounts are created on first unrecognized username and never deleted.
/// Only the ledger engine mutates balance and history; the account itself
/// exposes `credit`/`debit` as raw balance moves paired with a recorded
/// transaction.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique username; primary key in the durable store.
    pub username: String,

    /// Hex digest of the credential secret. Never the plaintext.
    pub secret_hash: String,

    /// Display name shown on the terminal.
    pub display_name: String,

    /// Unique fixed-width numeric account number.
    pub account_number: String,

    /// Current balance. Non-negative.
    pub balance: Money,

    /// Owned transaction history, oldest first. Empty until loaded or
    /// until the session records entries.
    pub transactions: Vec<Transaction>,
}

impl Account {
    /// Creates a fresh account with zero balance and empty history.
    pub fn new(
        username: String,
        secret_hash: String,
        display_name: String,
        account_number: String,
    ) -> Self {
        Account {
            username,
            secret_hash,
            display_name,
            account_number,
            balance: Money::ZERO,
            transactions: Vec::new(),
        }
    }

    /// Credits the balance and records the transaction.
    pub fn credit(&mut self, tx: Transaction) {
        self.balance += tx.amount;
        self.transactions.push(tx);
    }

    /// Debits the balance and records the transaction.
    ///
    /// The caller (the ledger engine) has already verified funds; this is
    /// a raw move paired with its record so the two can never diverge.
    pub fn debit(&mut self, tx: Transaction) {
        self.balance -= tx.amount;
        self.transactions.push(tx);
    }

    /// The most recent `limit` transactions, newest first.
    pub fn recent_transactions(&self, limit: usize) -> Vec<&Transaction> {
        self.transactions.iter().rev().take(limit).collect()
    }

    /// Signed sum of the recorded history.
    pub fn signed_sum(&self) -> Money {
        self.transactions.iter().map(|tx| tx.signed_amount()).sum()
    }

    /// Verifies the conservation invariant against a known starting
    /// balance (zero for accounts created this session).
    #[cfg(debug_assertions)]
    pub fn check_invariant(&self, starting_balance: Money) -> bool {
        self.balance == starting_balance + self.signed_sum()
    }
}
