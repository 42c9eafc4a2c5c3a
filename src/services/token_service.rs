// src/services/token_service.rs
use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use tracing::{debug, instrument, warn};

use crate::error::AuthError;
use crate::models::token::{Claims, InvalidReason, RESERVED_CLAIMS, TokenPair, TokenStatus};

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Which tokens may be exchanged for a new pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshPolicy {
    /// Only tokens carrying `rt=true`.
    #[default]
    RefreshTokenOnly,
    /// Any currently valid token, access tokens included.
    AnyValidToken,
}

#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

/// Signs and verifies HS256 tokens with a single immutable secret.
#[derive(Clone)]
pub struct TokenService {
    enc_key: EncodingKey,
    dec_key: DecodingKey,
    lifetimes: TokenLifetimes,
    refresh_policy: RefreshPolicy,
}

impl TokenService {
    pub fn new(secret_key: &str) -> Self {
        let enc_key = EncodingKey::from_secret(secret_key.as_bytes());
        let dec_key = DecodingKey::from_secret(secret_key.as_bytes());

        Self {
            enc_key,
            dec_key,
            lifetimes: TokenLifetimes::default(),
            refresh_policy: RefreshPolicy::default(),
        }
    }

    pub fn with_lifetimes(mut self, lifetimes: TokenLifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
        self.refresh_policy = policy;
        self
    }

    /* ---------- PUBLIC API ---------- */

    /// Mint a short-lived access token. Extension claims may not shadow
    /// registered claim names; such entries are dropped.
    #[instrument(skip(self, extra_claims))]
    pub fn generate_access_token(
        &self,
        user_id: &str,
        extra_claims: BTreeMap<String, String>,
    ) -> Result<String, AuthError> {
        let mut claims = Claims::access(user_id, Utc::now(), self.lifetimes.access);

        for (key, value) in extra_claims {
            if RESERVED_CLAIMS.contains(&key.as_str()) {
                warn!(claim = %key, "Ignoring extension claim that shadows a registered claim");
                continue;
            }
            claims.extra.insert(key, value);
        }

        self.sign(&claims)
    }

    /// Mint a long-lived refresh token (`rt=true`).
    #[instrument(skip(self))]
    pub fn generate_refresh_token(&self, user_id: &str) -> Result<String, AuthError> {
        let claims = Claims::refresh(user_id, Utc::now(), self.lifetimes.refresh);
        self.sign(&claims)
    }

    /// Mint an access + refresh pair with no extension claims.
    pub fn generate_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        let access_token = self.generate_access_token(user_id, BTreeMap::new())?;
        let refresh_token = self.generate_refresh_token(user_id)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Verify signature and expiry against the current time.
    ///
    /// Expired, mis-signed or otherwise unacceptable tokens yield
    /// `TokenStatus::Invalid`; only structurally broken input is an error.
    #[instrument(skip_all)]
    pub fn validate_token(&self, token: &str) -> Result<TokenStatus, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        match decode::<Claims>(token, &self.dec_key, &validation) {
            Ok(data) => Ok(TokenStatus::Valid(data.claims)),
            Err(e) => {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => InvalidReason::Expired,
                    ErrorKind::InvalidSignature => InvalidReason::BadSignature,
                    ErrorKind::ImmatureSignature => InvalidReason::NotYetValid,
                    ErrorKind::InvalidAlgorithm => InvalidReason::WrongAlgorithm,
                    _ => {
                        debug!(error = %e, "Rejecting malformed token");
                        return Err(AuthError::TokenMalformed(e));
                    }
                };
                debug!(?reason, "Token failed validation");
                Ok(TokenStatus::Invalid(reason))
            }
        }
    }

    /// Exchange a currently valid token for a brand-new pair for the same user.
    #[instrument(skip_all)]
    pub fn refresh_token(&self, token: &str) -> Result<TokenPair, AuthError> {
        let claims = match self.validate_token(token) {
            Ok(TokenStatus::Valid(claims)) => claims,
            Ok(TokenStatus::Invalid(_)) | Err(_) => return Err(AuthError::InvalidToken),
        };

        if self.refresh_policy == RefreshPolicy::RefreshTokenOnly && !claims.is_refresh() {
            warn!(user_id = %claims.user_id, "Access token presented for refresh");
            return Err(AuthError::InvalidToken);
        }

        self.generate_pair(&claims.user_id)
    }

    /* ---------- PRIVATE HELPERS ---------- */

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.enc_key)
            .map_err(AuthError::TokenSigning)
    }
}
