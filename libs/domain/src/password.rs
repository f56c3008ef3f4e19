use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use tracing::error;

use crate::error::{DomainError, DomainResult};

/// Hash a password with argon2 and a random salt
pub fn hash_password(password: &str) -> DomainResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            DomainError::Validation(format!("unable to hash password: {}", e))
        })
}

/// Login lives in the identity service; this check only backs the tests.
#[cfg(test)]
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> bool {
    use argon2::{PasswordHash, PasswordVerifier};

    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
