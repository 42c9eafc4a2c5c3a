use std::sync::Arc;
use std::time::Duration;

use crate::services::auth_service::AuthService;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(auth: AuthService, request_timeout: Duration) -> Self {
        Self {
            auth: Arc::new(auth),
            request_timeout,
        }
    }
}
