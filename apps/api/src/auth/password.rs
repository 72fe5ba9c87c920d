use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hashes a password with Argon2id and a fresh random salt.
pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Verifies a password against a stored Argon2id hash. A malformed stored
/// hash verifies as false rather than erroring.
pub fn verify(password: &str, stored: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let h = hash("hunter2-but-longer").unwrap();
        assert!(verify("hunter2-but-longer", &h));
        assert!(!verify("hunter2-but-wrong", &h));
    }

    #[test]
    fn test_malformed_stored_hash_verifies_false() {
        assert!(!verify("anything", "not-a-phc-string"));
    }
}
