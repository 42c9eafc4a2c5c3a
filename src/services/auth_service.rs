use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::context::CallContext;
use crate::error::{AuthError, DirectoryError};
use crate::models::token::{TokenPair, TokenStatus};
use crate::services::directory::{PasswordHasher, UserDirectory};
use crate::services::token_service::TokenService;

/// Sequences directory lookups, password checks and token issuance.
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenService,
    ) -> Self {
        Self {
            directory,
            hasher,
            tokens,
        }
    }

    #[instrument(skip(self, ctx, password))]
    pub async fn sign_up(
        &self,
        ctx: &CallContext,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        let user_id = ctx
            .run(self.directory.create_user(email, username, password))
            .await?;

        // The user exists now, but a cancelled caller still gets no tokens.
        ctx.check()?;

        let pair = self.tokens.generate_pair(&user_id)?;
        info!(user_id = %user_id, "User registered");
        Ok(pair)
    }

    #[instrument(skip(self, ctx, password))]
    pub async fn sign_in(
        &self,
        ctx: &CallContext,
        email: &str,
        password: &str,
    ) -> Result<TokenPair, AuthError> {
        let user = ctx
            .run(self.directory.get_user_by_email(email))
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::Directory(DirectoryError::NotFound)) {
                    warn!("Sign-in for unknown email");
                }
            })?;

        ctx.run(self.hasher.compare_password(password, &user.password_hash))
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::PasswordMismatch) {
                    warn!(user_id = %user.id, "Sign-in with wrong password");
                }
            })?;

        ctx.check()?;

        let pair = self.tokens.generate_pair(&user.id)?;
        info!(user_id = %user.id, "User signed in");
        Ok(pair)
    }

    pub fn verify_token(&self, token: &str) -> Result<TokenStatus, AuthError> {
        self.tokens.validate_token(token)
    }

    pub fn refresh_token(&self, token: &str) -> Result<TokenPair, AuthError> {
        self.tokens.refresh_token(token)
    }
}
