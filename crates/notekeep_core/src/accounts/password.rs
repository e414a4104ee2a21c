//! Password hashing.
//!
//! Hashes are PHC strings, so every hash carries the parameters it was
//! produced with and verification keeps working after a params change.

use crate::accounts::AccountError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use once_cell::sync::OnceCell;

const DUMMY_PASSWORD: &str = "notekeep-missing-account";

pub trait CredentialHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> Result<String, AccountError>;
    fn verify_password(&self, stored_hash: &str, password: &str) -> bool;

    /// Verifies against `stored_hash`, or burns one verification of the
    /// same cost and returns `false` when there is no account.
    fn verify_or_dummy(&self, stored_hash: Option<&str>, password: &str) -> bool;
}

impl<H: CredentialHasher + ?Sized> CredentialHasher for &H {
    fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        (**self).hash_password(password)
    }

    fn verify_password(&self, stored_hash: &str, password: &str) -> bool {
        (**self).verify_password(stored_hash, password)
    }

    fn verify_or_dummy(&self, stored_hash: Option<&str>, password: &str) -> bool {
        (**self).verify_or_dummy(stored_hash, password)
    }
}

/// Argon2id hasher.
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    params: Params,
    dummy_hash: OnceCell<String>,
}

impl Argon2Hasher {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            dummy_hash: OnceCell::new(),
        }
    }

    fn argon2(&self) -> Argon2<'_> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(Params::default())
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> Result<String, AccountError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| AccountError::Hash(err.to_string()))
    }

    fn verify_password(&self, stored_hash: &str, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    fn verify_or_dummy(&self, stored_hash: Option<&str>, password: &str) -> bool {
        match stored_hash {
            Some(hash) => self.verify_password(hash, password),
            None => {
                // Hashed with our own params so the dummy costs what a real check does.
                if let Ok(dummy) = self
                    .dummy_hash
                    .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
                {
                    let _ = self.verify_password(dummy, password);
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2Hasher, CredentialHasher};
    use argon2::Params;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::new(Params::new(8, 1, 1, None).expect("valid argon2 params"))
    }

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("abcd1234*").expect("hash should succeed");
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password(&hash, "abcd1234*"));
        assert!(!hasher.verify_password(&hash, "abcd1234"));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash_password("same").expect("hash should succeed");
        let second = hasher.hash_password("same").expect("hash should succeed");
        assert_ne!(first, second);
    }

    #[test]
    fn missing_account_never_verifies() {
        let hasher = fast_hasher();
        let hash = hasher.hash_password("abcd1234*").expect("hash should succeed");
        assert!(hasher.verify_or_dummy(Some(&hash), "abcd1234*"));
        assert!(!hasher.verify_or_dummy(None, "abcd1234*"));
        assert!(!hasher.verify_or_dummy(None, "notekeep-missing-account"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!fast_hasher().verify_password("not-a-phc-string", "anything"));
    }
}
