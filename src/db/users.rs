use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::error::DirectoryError;
use crate::models::user::User;
use crate::services::directory::{PasswordHasher, UserDirectory};

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DirectoryError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DirectoryError::AlreadyExists
            }
            _ => {
                error!(error = %err, "User directory query failed");
                DirectoryError::Backend(err.to_string())
            }
        }
    }
}

/// SQLite-backed user directory.
#[derive(Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
    hasher: Arc<dyn PasswordHasher>,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { pool, hasher }
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    #[instrument(skip(self, password))]
    async fn create_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<String, DirectoryError> {
        let password_hash = self
            .hasher
            .hash_password(password)
            .await
            .map_err(|e| DirectoryError::Backend(e.to_string()))?;

        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, username, password_hash)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        info!(user_id = %id, "Created user");
        Ok(id)
    }

    #[instrument(skip(self))]
    async fn get_user_by_email(&self, email: &str) -> Result<User, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, username, password_hash
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DirectoryError::NotFound)?;

        Ok(user)
    }
}
