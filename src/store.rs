//! Durable storage for accounts and transactions.
//!
//! The [`Store`] trait is the repository seam: existence checks for
//! identifier generation, keyed lookups, and upserts. Multi-row mutations
//! (transfer commit, session flush) are single trait methods so an adapter
//! can apply them as one atomic unit. [`SqliteStore`] is the shipped
//! adapter, holding one connection for the lifetime of the terminal.
//!
//! Schema: two keyed relations.
//! `accounts(username PK, secret_hash, display_name, account_number UNIQUE,
//! balance)` and `transactions(reference PK, account_number, amount, kind,
//! timestamp)`. Monetary values and timestamps are stored as text: decimal
//! strings and RFC 3339 respectively, never floats.
//!
//! The UNIQUE constraint on `account_number` turns a cross-terminal race on
//! number generation into a detectable write failure instead of a silent
//! duplicate; the generator's bounded retry absorbs it.

use crate::account::Account;
use crate::error::Result;
use crate::money::Money;
use crate::transaction::{Transaction, TxKind};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::{params, Connection};
use std::path::Path;
use std::str::FromStr;

/// Keyed durable storage for accounts and transactions.
///
/// Lookups return accounts with an empty in-memory history; callers load
/// transactions separately when they need them.
pub trait Store {
    /// Whether a transaction reference is already in use.
    fn reference_exists(&self, reference: &str) -> Result<bool>;

    /// Whether an account number is already assigned.
    fn account_number_exists(&self, account_number: &str) -> Result<bool>;

    /// Looks up an account by username (the session key).
    fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    /// Looks up an account by account number (the transfer key).
    fn find_by_account_number(&self, account_number: &str) -> Result<Option<Account>>;

    /// Loads an account's full transaction history, oldest first.
    fn load_transactions(&self, account_number: &str) -> Result<Vec<Transaction>>;

    /// Inserts or replaces a single account row, keyed by username.
    fn upsert_account(&mut self, account: &Account) -> Result<()>;

    /// Commits both sides of a transfer as one atomic unit: a complete
    /// snapshot of the debit account (row plus its full in-memory
    /// history, which includes the new out leg) and the credited
    /// account's row plus its in leg, all or nothing.
    ///
    /// The debit side is written whole because its balance may carry
    /// unflushed session mutations; committing the balance without their
    /// records would leave the durable copy unbalanced after a crash.
    fn commit_transfer(
        &mut self,
        debit: &Account,
        credit: &Account,
        in_leg: &Transaction,
    ) -> Result<()>;

    /// Flushes an account row plus its entire in-memory history as one
    /// atomic unit. Rows are keyed upserts, so re-running the flush with
    /// the same state is a no-op (idempotent reconciliation).
    fn flush_account(&mut self, account: &Account) -> Result<()>;
}

/// SQLite-backed store. One connection per terminal instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if absent) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Opens a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                username TEXT PRIMARY KEY,
                secret_hash TEXT NOT NULL,
                display_name TEXT NOT NULL,
                account_number TEXT NOT NULL UNIQUE,
                balance TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                reference TEXT PRIMARY KEY,
                account_number TEXT NOT NULL,
                amount TEXT NOT NULL,
                kind TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_transactions_account
             ON transactions(account_number)",
            [],
        )?;

        Ok(SqliteStore { conn })
    }
}

/// Maps a `SELECT username, secret_hash, display_name, account_number,
/// balance` row into an account with empty history.
fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    let balance_text: String = row.get(4)?;
    let balance = Money::from_str(&balance_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Account {
        username: row.get(0)?,
        secret_hash: row.get(1)?,
        display_name: row.get(2)?,
        account_number: row.get(3)?,
        balance,
        transactions: Vec::new(),
    })
}

/// Maps a `SELECT reference, account_number, amount, kind, timestamp` row.
fn transaction_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let amount_text: String = row.get(2)?;
    let amount = Money::from_str(&amount_text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let kind_text: String = row.get(3)?;
    let kind = TxKind::parse(&kind_text).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown transaction kind: {kind_text}").into(),
        )
    })?;

    let timestamp_text: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_text)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?
        .with_timezone(&Utc);

    Ok(Transaction {
        reference: row.get(0)?,
        account_number: row.get(1)?,
        amount,
        kind,
        timestamp,
    })
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    // Fixed-width fraction keeps RFC 3339 text lexicographically sortable.
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// Targeted upsert: a same-username rewrite updates in place, while an
// account_number collision from another username still violates the
// UNIQUE constraint instead of silently replacing the other row.
fn upsert_account_row(conn: &Connection, account: &Account) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO accounts
             (username, secret_hash, display_name, account_number, balance)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(username) DO UPDATE SET
             secret_hash = excluded.secret_hash,
             display_name = excluded.display_name,
             account_number = excluded.account_number,
             balance = excluded.balance",
        params![
            account.username,
            account.secret_hash,
            account.display_name,
            account.account_number,
            account.balance.to_string(),
        ],
    )?;
    Ok(())
}

fn upsert_transaction_row(conn: &Connection, tx: &Transaction) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO transactions
             (reference, account_number, amount, kind, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            tx.reference,
            tx.account_number,
            tx.amount.to_string(),
            tx.kind.as_str(),
            format_timestamp(&tx.timestamp),
        ],
    )?;
    Ok(())
}

impl Store for SqliteStore {
    fn reference_exists(&self, reference: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE reference = ?1",
            params![reference],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn account_number_exists(&self, account_number: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accounts WHERE account_number = ?1",
            params![account_number],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT username, secret_hash, display_name, account_number, balance
             FROM accounts WHERE username = ?1",
        )?;
        let mut rows = stmt.query_map(params![username], account_from_row)?;

        rows.next().transpose().map_err(Into::into)
    }

    fn find_by_account_number(&self, account_number: &str) -> Result<Option<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT username, secret_hash, display_name, account_number, balance
             FROM accounts WHERE account_number = ?1",
        )?;
        let mut rows = stmt.query_map(params![account_number], account_from_row)?;

        rows.next().transpose().map_err(Into::into)
    }

    fn load_transactions(&self, account_number: &str) -> Result<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT reference, account_number, amount, kind, timestamp
             FROM transactions WHERE account_number = ?1
             ORDER BY timestamp, rowid",
        )?;
        let transactions = stmt
            .query_map(params![account_number], transaction_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(transactions)
    }

    fn upsert_account(&mut self, account: &Account) -> Result<()> {
        upsert_account_row(&self.conn, account)?;
        Ok(())
    }

    fn commit_transfer(
        &mut self,
        debit: &Account,
        credit: &Account,
        in_leg: &Transaction,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        upsert_account_row(&tx, debit)?;
        for entry in &debit.transactions {
            upsert_transaction_row(&tx, entry)?;
        }
        upsert_account_row(&tx, credit)?;
        upsert_transaction_row(&tx, in_leg)?;
        tx.commit()?;

        debug!(
            "Committed transfer {} -> {} ({})",
            debit.account_number, credit.account_number, in_leg.amount
        );
        Ok(())
    }

    fn flush_account(&mut self, account: &Account) -> Result<()> {
        let tx = self.conn.transaction()?;
        upsert_account_row(&tx, account)?;
        for entry in &account.transactions {
            upsert_transaction_row(&tx, entry)?;
        }
        tx.commit()?;

        debug!(
            "Flushed account {} with {} transactions",
            account.username,
            account.transactions.len()
        );
        Ok(())
    }
}
