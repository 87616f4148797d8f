//! Transaction model: immutable, reference-stamped ledger entries.

use crate::money::Money;
use chrono::{DateTime, Utc};
use std::fmt;

/// Transaction type variants.
///
/// Transfers are recorded as a correlated pair: a `TransferOut` on the
/// source account and a `TransferIn` on the destination, sharing one
/// operation reference with `-out` / `-in` suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    /// Credit funds to the account.
    Deposit,

    /// Debit funds from the account.
    Withdrawal,

    /// Debit leg of a transfer.
    TransferOut,

    /// Credit leg of a transfer.
    TransferIn,
}

impl TxKind {
    /// Stable storage tag, used as the `kind` column in the durable store.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdrawal => "withdrawal",
            TxKind::TransferOut => "transfer-out",
            TxKind::TransferIn => "transfer-in",
        }
    }

    /// Parses a storage tag back into a kind.
    ///
    /// Returns `None` for unknown tags so a corrupted row surfaces as a
    /// load failure instead of a silently misclassified entry.
    pub fn parse(tag: &str) -> Option<TxKind> {
        match tag.trim() {
            "deposit" => Some(TxKind::Deposit),
            "withdrawal" => Some(TxKind::Withdrawal),
            "transfer-out" => Some(TxKind::TransferOut),
            "transfer-in" => Some(TxKind::TransferIn),
            _ => None,
        }
    }

    /// Returns `true` for kinds that credit the account.
    pub fn is_credit(&self) -> bool {
        matches!(self, TxKind::Deposit | TxKind::TransferIn)
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single ledger entry.
///
/// Immutable once created, owned by exactly one account, append-only.
/// The `reference` is globally unique across all accounts and serves as
/// the primary key in the durable store.
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Globally unique reference string
    pub reference: String,

    /// Owning account number
    pub account_number: String,

    /// Transaction amount (always positive; the kind carries the sign)
    pub amount: Money,

    /// Transaction type
    pub kind: TxKind,

    /// Wall-clock creation time
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Creates a transaction stamped with the current time.
    pub fn new(reference: String, account_number: String, amount: Money, kind: TxKind) -> Self {
        Transaction {
            reference,
            account_number,
            amount,
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Amount with the sign implied by the kind: credits positive,
    /// debits negative. The sum of signed amounts over an account's
    /// history equals its balance (conservation invariant).
    pub fn signed_amount(&self) -> Money {
        if self.kind.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}
