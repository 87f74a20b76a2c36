//! Account endpoints.
//!
//! `POST /api/auth/register` — Unprotected: create an account
//! `POST /api/auth/login` — Unprotected: verify credentials, open a session
//! `POST /api/auth/logout` — Protected: end the current session

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::accounts::Account;
use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::ApiContext;

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct RegisterRequest {
    #[zeroize(skip)]
    pub name: String,
    #[zeroize(skip)]
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    #[zeroize(skip)]
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub name: String,
    pub username: String,
}

/// `POST /api/auth/register` — 201 with the new account.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let accounts = ctx.accounts.clone();
    let account = tokio::task::spawn_blocking(move || {
        accounts.register(&request.name, &request.username, &request.password)
    })
    .await??;

    Ok((StatusCode::CREATED, Json(account)))
}

/// `POST /api/auth/login` — returns a bearer token bound to a fresh
/// dataset snapshot.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let accounts = ctx.accounts.clone();
    let datasets = ctx.datasets.clone();
    let (account, dataset) = tokio::task::spawn_blocking(move || {
        let account = accounts.authenticate(&request.username, &request.password)?;
        let dataset = datasets
            .snapshot()
            .map_err(|e| ApiError::Internal(format!("dataset load failed: {e}")))?;
        Ok::<_, ApiError>((account, dataset))
    })
    .await??;

    let token = ctx.sessions.create(&account, dataset);
    tracing::info!(user = %account.username, "Login succeeded");

    Ok(Json(LoginResponse {
        token,
        name: account.name,
        username: account.username,
    }))
}

/// `POST /api/auth/logout` — 204.
pub async fn logout(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = bearer_token(&headers).ok_or(ApiError::Unauthorized)?;
    ctx.sessions.remove(token);
    Ok(StatusCode::NO_CONTENT)
}
