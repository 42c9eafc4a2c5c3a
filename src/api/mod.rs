use axum::extract::FromRequest;

use crate::error::AuthError;

pub mod auth;

/// `Json` extractor whose rejections render as `AuthError` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AuthError))]
pub struct AppJson<T>(pub T);
