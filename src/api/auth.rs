use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::AppJson;
use crate::context::CallContext;
use crate::error::AuthError;
use crate::models::token::TokenPair;
use crate::models::user::NewUser;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignInRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct TokenRequest {
    token: String,
}

#[derive(Serialize)]
pub struct VerifyTokenResponse {
    valid: bool,
    claims: HashMap<String, String>,
}

pub async fn sign_up(
    State(state): State<AppState>,
    AppJson(payload): AppJson<NewUser>,
) -> Result<Json<TokenPair>, AuthError> {
    let ctx = CallContext::with_timeout(state.request_timeout);
    let _guard = ctx.cancel_on_drop();
    let pair = state
        .auth
        .sign_up(&ctx, &payload.email, &payload.username, &payload.password)
        .await?;

    Ok(Json(pair))
}

pub async fn sign_in(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignInRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let ctx = CallContext::with_timeout(state.request_timeout);
    let _guard = ctx.cancel_on_drop();
    let pair = state
        .auth
        .sign_in(&ctx, &payload.email, &payload.password)
        .await?;

    Ok(Json(pair))
}

pub async fn verify_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<VerifyTokenResponse>, AuthError> {
    let status = state.auth.verify_token(&payload.token)?;
    let valid = status.is_valid();
    let claims = status
        .into_claims()
        .map(|claims| claims.to_string_map())
        .unwrap_or_default();

    Ok(Json(VerifyTokenResponse { valid, claims }))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let pair = state.auth.refresh_token(&payload.token)?;
    Ok(Json(pair))
}
