//! Terminal (ATM) layer: session authentication and the cash vault.
//!
//! Wraps the ledger with two terminal-level concerns. Authentication
//! resolves a username against the store and verifies the secret through
//! the [`SecretVerifier`] seam; an unknown username is reported so the
//! caller can register on first use. Withdrawals are vault-gated: the
//! terminal refuses to dispense more cash than it physically holds,
//! regardless of the customer's balance, and the vault only moves in
//! lock-step with a successful ledger debit.
//!
//! The vault starts at 10000.00 per terminal instantiation and is not
//! persisted across runs.

use crate::account::Account;
use crate::auth::{SecretVerifier, Sha256Verifier};
use crate::engine::Ledger;
use crate::error::{Result, TellerError};
use crate::money::Money;
use crate::store::Store;
use log::{info, warn};

/// Cash on hand when a terminal is instantiated, in currency units.
pub const VAULT_STARTING_BALANCE: i64 = 10_000;

/// Outcome of a credential check. Not an error: the caller decides
/// whether to retry, register, or give up.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Credentials matched; the account and its history are loaded.
    Authenticated(Account),

    /// Username known, secret mismatch.
    WrongSecret,

    /// Username unknown; registration-on-first-use applies.
    UnknownUser,
}

/// A cash-dispensing terminal: one vault, one ledger, one active session.
pub struct Terminal<S: Store> {
    ledger: Ledger<S>,
    vault: Money,
    verifier: Box<dyn SecretVerifier>,
}

impl<S: Store> Terminal<S> {
    /// Creates a terminal over `store` with the default SHA-256 secret
    /// verifier and a freshly stocked vault.
    pub fn new(store: S) -> Self {
        Terminal::with_verifier(store, Box::new(Sha256Verifier))
    }

    /// Creates a terminal with an explicit secret verifier.
    pub fn with_verifier(store: S, verifier: Box<dyn SecretVerifier>) -> Self {
        Terminal {
            ledger: Ledger::new(store),
            vault: Money::from(VAULT_STARTING_BALANCE),
            verifier,
        }
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger<S> {
        &mut self.ledger
    }

    /// Current cash on hand.
    pub fn vault_balance(&self) -> Money {
        self.vault
    }

    /// Checks credentials against the store.
    ///
    /// On success the returned account carries its full transaction
    /// history, ready for the session.
    pub fn authenticate(&mut self, username: &str, secret: &str) -> Result<AuthOutcome> {
        let account = match self.ledger.store().find_by_username(username)? {
            Some(account) => account,
            None => return Ok(AuthOutcome::UnknownUser),
        };

        if !self.verifier.verify(secret, &account.secret_hash) {
            warn!("Failed authentication for username {username}");
            return Ok(AuthOutcome::WrongSecret);
        }

        let mut account = account;
        account.transactions = self
            .ledger
            .store()
            .load_transactions(&account.account_number)?;

        info!("Authenticated session for {username}");
        Ok(AuthOutcome::Authenticated(account))
    }

    /// Registers a first-time customer: hashes the secret, assigns an
    /// account number, and persists the empty account.
    pub fn register(&mut self, username: &str, secret: &str, display_name: &str) -> Result<Account> {
        let secret_hash = self.verifier.hash(secret);
        let account = self
            .ledger
            .open_account(username, &secret_hash, display_name)?;

        info!("Registered new customer {username}");
        Ok(account)
    }

    /// Dispenses cash: vault gate first, then the ledger debit, then the
    /// vault decrement in lock-step.
    ///
    /// A vault shortfall ([`TellerError::VaultInsufficient`]) leaves the
    /// personal ledger untouched; a ledger failure leaves the vault
    /// untouched.
    pub fn withdraw_cash(&mut self, account: &mut Account, amount: Money) -> Result<String> {
        if amount > self.vault {
            warn!(
                "Vault cannot cover withdrawal of {} (holding {})",
                amount, self.vault
            );
            return Err(TellerError::VaultInsufficient {
                requested: amount,
                vault: self.vault,
            });
        }

        let reference = self.ledger.withdraw(account, amount)?;
        self.vault -= amount;
        Ok(reference)
    }

    /// Technician replenishment: tops up the vault. Independent of any
    /// customer account; no upper bound.
    pub fn replenish(&mut self, amount: Money) -> Result<()> {
        if !amount.is_positive() {
            return Err(TellerError::InvalidAmount(amount.to_string()));
        }

        self.vault += amount;
        info!("Vault replenished by {}, now {}", amount, self.vault);
        Ok(())
    }
}

/// The technician's maintenance surface. Everything except vault work is
/// a placeholder in this simulator.
#[derive(Debug, Default)]
pub struct Technician;

impl Technician {
    pub fn perform_maintenance(&self) {
        info!("Technician performing maintenance");
    }

    pub fn perform_repairs(&self) {
        info!("Technician performing repairs");
    }

    pub fn upgrade_hardware(&self) {
        info!("Technician upgrading hardware");
    }

    pub fn upgrade_firmware(&self) {
        info!("Technician upgrading firmware");
    }
}
