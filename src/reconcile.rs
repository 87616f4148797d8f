//! Session-end reconciliation.
//!
//! Flushes the mutated in-memory account and its transactions back to the
//! durable store. The flush itself is one atomic keyed upsert batch (see
//! [`Store::flush_account`]), which makes it idempotent: rows already
//! durable and unchanged are rewritten as no-ops. A store outage is
//! retried with backoff rather than silently dropping mutations.

use crate::account::Account;
use crate::error::Result;
use crate::store::Store;
use log::{info, warn};
use std::thread;
use std::time::Duration;

/// Attempts before a store outage is surfaced to the caller.
pub const MAX_FLUSH_ATTEMPTS: u32 = 3;

/// Base delay between attempts; grows linearly per attempt.
const BACKOFF: Duration = Duration::from_millis(200);

/// Writes `account` and its full transaction history to the store,
/// retrying retryable failures up to [`MAX_FLUSH_ATTEMPTS`] times.
pub fn flush_session<S: Store>(store: &mut S, account: &Account) -> Result<()> {
    let mut attempt = 1;
    loop {
        match store.flush_account(account) {
            Ok(()) => {
                info!(
                    "Reconciled session for {}: {} transactions durable",
                    account.username,
                    account.transactions.len()
                );
                return Ok(());
            }
            Err(err) if err.is_retryable() && attempt < MAX_FLUSH_ATTEMPTS => {
                warn!("Flush attempt {attempt} failed: {err}; retrying");
                thread::sleep(BACKOFF * attempt);
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
