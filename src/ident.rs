//! Unique identifier generation by rejection sampling.
//!
//! References and account numbers are drawn uniformly and redrawn on
//! collision against the durable store. The existence check is injected as
//! a closure, so the generator itself has no side effects and does not
//! reserve identifiers; the caller must persist promptly. Retry loops are
//! bounded: saturation surfaces as an error rather than a hang.

use crate::error::{Result, TellerError};
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of a transaction reference.
pub const REFERENCE_LEN: usize = 10;

/// Inclusive bounds of the account number space.
pub const ACCOUNT_NUMBER_MIN: u32 = 10_000_000;
pub const ACCOUNT_NUMBER_MAX: u32 = 99_999_999;

/// Default ceiling on redraw attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Draws collision-free identifiers against caller-supplied existence
/// checks.
#[derive(Debug, Clone, Copy)]
pub struct IdGenerator {
    max_attempts: u32,
}

impl IdGenerator {
    pub fn new(max_attempts: u32) -> Self {
        IdGenerator { max_attempts }
    }

    /// Generates a fresh transaction reference: a fixed-length string
    /// drawn uniformly from the alphanumeric alphabet.
    ///
    /// `exists` queries the store (or any other namespace) for a prior
    /// use of the candidate. Errors from the check propagate unchanged.
    /// Returns [`TellerError::ReferenceExhausted`] once the attempt
    /// ceiling is hit.
    pub fn reference<F>(&self, mut exists: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        let mut rng = rand::thread_rng();
        for _ in 0..self.max_attempts {
            let candidate: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(REFERENCE_LEN)
                .map(char::from)
                .collect();

            if !exists(&candidate)? {
                return Ok(candidate);
            }
        }

        Err(TellerError::ReferenceExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Generates an unassigned account number from the fixed-width
    /// numeric space, same rejection-sampling pattern as references.
    pub fn account_number<F>(&self, mut exists: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        let mut rng = rand::thread_rng();
        for _ in 0..self.max_attempts {
            let candidate = rng
                .gen_range(ACCOUNT_NUMBER_MIN..=ACCOUNT_NUMBER_MAX)
                .to_string();

            if !exists(&candidate)? {
                return Ok(candidate);
            }
        }

        Err(TellerError::AccountNumberExhausted {
            attempts: self.max_attempts,
        })
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        IdGenerator::new(DEFAULT_MAX_ATTEMPTS)
    }
}
