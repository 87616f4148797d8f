//! Credential verification abstraction.
//!
//! Secrets are stored as digests and compared through a trait, so the
//! storage format and comparison algorithm can change without touching
//! ledger or terminal logic.

use sha2::{Digest, Sha256};

/// Hashes and verifies credential secrets.
pub trait SecretVerifier {
    /// Digest of a plaintext secret, in the stored format.
    fn hash(&self, secret: &str) -> String;

    /// Compares a plaintext secret against a stored digest.
    fn verify(&self, secret: &str, stored_hash: &str) -> bool;
}

/// SHA-256 hex digest verifier. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Verifier;

impl SecretVerifier for Sha256Verifier {
    fn hash(&self, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        self.hash(secret) == stored_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_sha256() {
        let verifier = Sha256Verifier;
        let digest = verifier.hash("1234");

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_verify_accepts_matching_secret() {
        let verifier = Sha256Verifier;
        let stored = verifier.hash("hunter2");

        assert!(verifier.verify("hunter2", &stored));
        assert!(!verifier.verify("hunter3", &stored));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let verifier = Sha256Verifier;
        assert_eq!(verifier.hash("0000"), verifier.hash("0000"));
    }
}
