use async_trait::async_trait;

use crate::error::{DirectoryError, HashError};
use crate::models::user::User;

/// Service of record for user identities and their stored credentials.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Creates a user and returns its identifier. The directory owns hashing
    /// and storage of `password`.
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<String, DirectoryError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, DirectoryError>;
}

#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash_password(&self, plaintext: &str) -> Result<String, HashError>;

    /// `Ok(())` on match, `HashError::Mismatch` otherwise.
    async fn compare_password(&self, plaintext: &str, stored_hash: &str) -> Result<(), HashError>;
}
