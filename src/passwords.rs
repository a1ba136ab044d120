use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ApiError;

/// hash_password
///
/// Hashes a password using Argon2id with a random salt. The resulting PHC string is
/// suitable for storage in `users.password_hash`. Hashing failures are internal
/// errors: they leak nothing about the input and should never reach the client in
/// any other form.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("password hashing failed: {:?}", e);
            ApiError::Internal
        })
}

/// verify_password
///
/// Verifies a password against a stored PHC hash. An unparseable stored hash counts
/// as a mismatch rather than an error: the login path answers "Invalid credentials"
/// either way and the corrupt record is a server-side problem to log, not a client one.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash unparseable: {:?}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_and_verifies() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("battery staple", &hash));
    }

    #[test]
    fn rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
