use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::HashError;
use crate::services::directory::PasswordHasher;

/// bcrypt on the blocking pool so slow hashes don't stall the runtime.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash_password(&self, plaintext: &str) -> Result<String, HashError> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || hash(plaintext, cost))
            .await
            .map_err(|e| HashError::Failed(e.to_string()))?
            .map_err(|e| HashError::Failed(e.to_string()))
    }

    async fn compare_password(&self, plaintext: &str, stored_hash: &str) -> Result<(), HashError> {
        let plaintext = plaintext.to_owned();
        let stored_hash = stored_hash.to_owned();

        let matches = tokio::task::spawn_blocking(move || verify(plaintext, &stored_hash))
            .await
            .map_err(|e| HashError::Failed(e.to_string()))?
            .map_err(|e| HashError::Failed(e.to_string()))?;

        if matches { Ok(()) } else { Err(HashError::Mismatch) }
    }
}
