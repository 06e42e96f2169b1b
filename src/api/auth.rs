//! User endpoints and the bearer-token extractor.

use axum::extract::{FromRequestParts, Path, State};
use axum::http::{header, request::Parts};
use axum::{Form, Json};
use std::sync::Arc;
use tracing::info;

use crate::api::{
    ApiError, AppState, DetailResponse, ExistsResponse, ForgotPasswordRequest, LoginForm,
    MsgResponse, RegisterRequest, ResetPasswordRequest, TokenResponse, UserResponse,
};
use crate::db::User;

/// Authenticated caller, resolved from the `Authorization: Bearer` header.
///
/// Any failure along the way (missing header, bad signature, expired or
/// superseded token, deleted user) collapses into the same 401 so the
/// response does not reveal which check failed.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(ApiError::unauthorized_credentials)?;

        let user = state.auth.current_user(token).await?;
        tracing::Span::current().record("user_id", user.id);
        Ok(Self(user))
    }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    info!(user_id = user.id, username = %user.username, "User registered");
    Ok(Json(UserResponse::from(user)))
}

/// OAuth2 password grant; the form's `username` field carries the email.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let access_token = state.auth.login(&form.username, &form.password).await?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DetailResponse>, ApiError> {
    state.auth.logout(&user).await?;

    info!(user_id = user.id, "User logged out");
    Ok(Json(DetailResponse {
        detail: "Successfully logged out".to_string(),
    }))
}

pub async fn exists(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let user = state.store.get_user_by_username(&username).await?;
    Ok(Json(ExistsResponse {
        exists: user.is_some(),
    }))
}

pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MsgResponse>, ApiError> {
    state.auth.request_password_reset(&payload.email).await?;

    Ok(Json(MsgResponse {
        msg: "Password reset email sent".to_string(),
    }))
}

pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MsgResponse>, ApiError> {
    state
        .auth
        .reset_password(&payload.token, &payload.new_password)
        .await?;

    Ok(Json(MsgResponse {
        msg: "Password updated successfully".to_string(),
    }))
}
