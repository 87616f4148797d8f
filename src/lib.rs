//! # Teller
//!
//! A cash-terminal simulator operating against customer accounts held in
//! a durable SQLite ledger.
//!
//! ## Design Principles
//!
//! - **Fixed-point arithmetic**: decimal currency at 2 places via `rust_decimal`
//! - **Conservation invariant**: balance equals the signed sum of recorded transactions
//! - **Unique identifiers**: rejection-sampled references and account numbers with bounded retries
//! - **Atomic multi-row mutations**: transfers and session flushes commit as one unit
//!
//! ## Example
//!
//! ```no_run
//! use teller::{Money, SqliteStore, Terminal};
//! use std::str::FromStr;
//!
//! let store = SqliteStore::open("atm.db").unwrap();
//! let mut terminal = Terminal::new(store);
//! let mut account = terminal.register("alice", "1234", "Alice Example").unwrap();
//! terminal
//!     .ledger_mut()
//!     .deposit(&mut account, Money::from_str("100.00").unwrap())
//!     .unwrap();
//! ```

pub mod account;
pub mod auth;
pub mod engine;
pub mod error;
pub mod ident;
pub mod money;
pub mod reconcile;
pub mod session;
pub mod store;
pub mod terminal;
pub mod transaction;

pub use account::Account;
pub use auth::{SecretVerifier, Sha256Verifier};
pub use engine::Ledger;
pub use error::{Result, TellerError};
pub use ident::IdGenerator;
pub use money::Money;
pub use session::Session;
pub use store::{SqliteStore, Store};
pub use terminal::{AuthOutcome, Technician, Terminal};
pub use transaction::{Transaction, TxKind};
