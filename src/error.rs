//! Error types for the teller engine.

use crate::money::Money;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, TellerError>;

/// Errors that can occur during terminal and ledger operation.
///
/// Authentication outcomes (wrong secret, unknown user) are not errors;
/// they are reported by [`crate::terminal::AuthOutcome`] so callers may
/// retry or register.
#[derive(Error, Debug)]
pub enum TellerError {
    /// Amount was non-positive or could not be parsed
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Withdrawal or transfer exceeds the customer's balance
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// Terminal cash on hand is below the requested amount
    #[error("terminal cannot dispense {requested}: vault holds {vault}")]
    VaultInsufficient { requested: Money, vault: Money },

    /// Transfer target account does not exist
    #[error("destination account {0} not found")]
    DestinationNotFound(String),

    /// Reference space saturated after bounded retries
    #[error("reference generation exhausted after {attempts} attempts")]
    ReferenceExhausted { attempts: u32 },

    /// Account number space saturated after bounded retries
    #[error("account number generation exhausted after {attempts} attempts")]
    AccountNumberExhausted { attempts: u32 },

    /// Durable store I/O failure; retryable at the reconciliation boundary
    #[error("durable store unavailable: {0}")]
    StoreUnavailable(#[from] rusqlite::Error),

    /// Failed to read or write the console or a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TellerError {
    /// Returns `true` for failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TellerError::StoreUnavailable(_))
    }
}
