use std::sync::Arc;

use tracing::instrument;

use crate::application::require_non_blank;
use crate::data::user_repository::UserRepository;
use crate::domain::user::DEFAULT_ROLE;
use crate::domain::{error::DomainError, user::User};
use crate::infrastructure::security::PasswordHasher;

#[derive(Clone)]
pub struct AuthService<R: UserRepository + 'static> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<R> AuthService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(repo: Arc<R>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { repo, hasher }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<User, DomainError> {
        require_non_blank("username", username)?;
        require_non_blank("password", password)?;

        // The unique constraint catches the race where two registrations
        // pass this check at once; the repository maps that violation to
        // the same error.
        if self.repo.exists_by_username(username).await? {
            return Err(DomainError::UsernameTaken);
        }

        let hash = self
            .hasher
            .hash(password)
            .map_err(|e| DomainError::Storage(format!("password hashing failed: {}", e)))?;
        let roles = vec![DEFAULT_ROLE.to_string()];
        self.repo.create(username, &hash, &roles).await
    }

    /// An unknown username and a wrong password fail identically, so the
    /// response never reveals which one it was.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, DomainError> {
        let user = self
            .repo
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    /// Reversible stand-in so the tests don't pay for argon2.
    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, argon2::password_hash::Error> {
            Ok(format!("hashed::{}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("hashed::{}", password)
        }
    }

    fn service() -> AuthService<MemoryStore> {
        AuthService::new(Arc::new(MemoryStore::default()), Arc::new(PlainHasher))
    }

    #[tokio::test]
    async fn register_stores_a_hash_and_the_default_role() {
        let service = service();
        let user = service.register("alice", "pw1").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "pw1");
        assert_eq!(user.roles, vec![DEFAULT_ROLE.to_string()]);
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let service = service();
        let err = service.register("  ", "pw").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let err = service.register("alice", "").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn register_then_duplicate_then_login() {
        let service = service();

        service.register("alice", "pw1").await.unwrap();

        let err = service.register("alice", "pw2").await.unwrap_err();
        assert!(matches!(err, DomainError::UsernameTaken));
        assert_eq!(err.to_string(), "Username already exists");

        let user = service.login("alice", "pw1").await.unwrap();
        assert_eq!(user.username, "alice");

        let err = service.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_user_and_wrong_password_fail_identically() {
        let service = service();
        service.register("alice", "pw1").await.unwrap();

        let unknown = service.login("nobody", "pw1").await.unwrap_err();
        let wrong = service.login("alice", "bad").await.unwrap_err();

        assert!(matches!(unknown, DomainError::InvalidCredentials));
        assert!(matches!(wrong, DomainError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }
}
