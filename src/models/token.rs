// src/models/token.rs
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claim names owned by the token service. Extension claims may not reuse them.
/// `aud`, `iss`, `sub` and `nbf` are inspected by the JWT validator itself.
pub const RESERVED_CLAIMS: [&str; 9] = [
    "user_id", "exp", "iat", "jti", "rt", "aud", "iss", "sub", "nbf",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,    // subject
    pub exp: i64,           // expiration time
    pub iat: i64,           // issued at
    pub jti: String,        // unique per token
    #[serde(default, skip_serializing_if = "is_false")]
    pub rt: bool,           // refresh token marker
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Claims {
    pub fn access(user_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            user_id: user_id.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
            rt: false,
            extra: BTreeMap::new(),
        }
    }

    pub fn refresh(user_id: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            rt: true,
            ..Self::access(user_id, now, ttl)
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.rt
    }

    /// Flattens the claims into the string map returned to RPC callers.
    pub fn to_string_map(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = self
            .extra
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        map.insert("user_id".to_string(), self.user_id.clone());
        map.insert("exp".to_string(), self.exp.to_string());
        map.insert("iat".to_string(), self.iat.to_string());
        map.insert("jti".to_string(), self.jti.clone());
        if self.rt {
            map.insert("rt".to_string(), "true".to_string());
        }

        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a well-formed token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Expired,
    BadSignature,
    NotYetValid,
    WrongAlgorithm,
}

/// Outcome of validating a structurally sound token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(Claims),
    Invalid(InvalidReason),
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid(_))
    }

    pub fn into_claims(self) -> Option<Claims> {
        match self {
            TokenStatus::Valid(claims) => Some(claims),
            TokenStatus::Invalid(_) => None,
        }
    }
}
