use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

/// Stateless hashing dependency injected into the credential service, so
/// tests can substitute a cheap implementation.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error>;
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2 with a per-hash random salt.
#[derive(Clone, Default)]
pub struct ArgonHasher;

impl PasswordHasher for ArgonHasher {
    fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
        hash_password(password)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        verify_password(password, hash).unwrap_or(false)
    }
}

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    let argon2 = Argon2::default();
    Ok(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("s3cret").unwrap();
        let b = hash_password("s3cret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        assert!(!ArgonHasher.verify("s3cret", "not-a-phc-string"));
    }
}
