//! Account registration
//!
//! - POST /api/users - Register and receive a token

use bytes::Bytes;
use hyper::Response;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, MIN_PASSWORD_LEN};
use crate::db::schemas::UserDoc;
use crate::routes::response::{ok_json, parse_json, BoxBody};
use crate::server::AppState;
use crate::types::{ConnectorError, Result};
use crate::validation::Validator;

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Sign a token for `user`
pub fn issue_token(state: &AppState, user: &UserDoc) -> Result<TokenResponse> {
    let id = user
        ._id
        .ok_or_else(|| ConnectorError::Internal("User has no id".into()))?;
    let token = state.jwt.generate_token(&id.to_hex())?;
    Ok(TokenResponse { token })
}

/// POST /api/users
pub async fn register(state: &AppState, body: &Bytes) -> Result<Response<BoxBody>> {
    let req: RegisterRequest = parse_json(body)?;

    Validator::new()
        .required("name", req.name.as_deref(), "Name is required")
        .email("email", req.email.as_deref(), "Please include a valid email")
        .min_len(
            "password",
            req.password.as_deref(),
            MIN_PASSWORD_LEN,
            "Please enter a password with 6 or more characters",
        )
        .finish()?;

    let (name, email, password) = match (req.name, req.email, req.password) {
        (Some(n), Some(e), Some(p)) => (n, e, p),
        _ => return Err(ConnectorError::Internal("Validated fields missing".into())),
    };

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ConnectorError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password(&password)?;
    let user = state
        .store
        .insert_user(UserDoc::new(name.trim().to_string(), &email, password_hash))
        .await?;

    info!(email = %user.email, "Registered user");
    Ok(ok_json(&issue_token(state, &user)?))
}
