//! Session endpoints
//!
//! - POST /api/auth - Exchange email and password for a token
//! - GET  /api/auth - Current user from token

use bytes::Bytes;
use hyper::{HeaderMap, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{authenticate, verify_password};
use crate::routes::response::{ok_json, parse_json, BoxBody};
use crate::routes::users::issue_token;
use crate::routes::views::UserView;
use crate::server::AppState;
use crate::types::{ConnectorError, Result};
use crate::validation::Validator;

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn invalid_credentials() -> ConnectorError {
    ConnectorError::Unauthorized("Invalid credentials".into())
}

/// POST /api/auth
pub async fn login(state: &AppState, body: &Bytes) -> Result<Response<BoxBody>> {
    let req: LoginRequest = parse_json(body)?;

    Validator::new()
        .email("email", req.email.as_deref(), "Please include a valid email")
        .required("password", req.password.as_deref(), "Password is required")
        .finish()?;

    let email = req.email.unwrap_or_default();
    let password = req.password.unwrap_or_default();

    // Unknown email and wrong password look the same to the client
    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!("Login attempt for unknown email");
        return Err(invalid_credentials());
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %user.email, "Login with wrong password");
        return Err(invalid_credentials());
    }

    info!(email = %user.email, "User logged in");
    Ok(ok_json(&issue_token(state, &user)?))
}

/// GET /api/auth
pub async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<Response<BoxBody>> {
    let caller = authenticate(headers, &state.jwt)?;

    let user = state
        .store
        .find_user(&caller.id)
        .await?
        .ok_or_else(|| ConnectorError::NotFound("User not found".into()))?;

    Ok(ok_json(&UserView::from(&user)))
}
