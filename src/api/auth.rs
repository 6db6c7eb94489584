//! Authentication endpoints

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    services::{self, auth::ChangeCredentials, session::SessionInfo},
};

use super::CurrentAdmin;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Generic status message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Credential change request
#[derive(Deserialize, ToSchema)]
pub struct ChangeCredentialsRequest {
    pub current_password: String,
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

/// Credential change result
#[derive(Serialize, ToSchema)]
pub struct ChangeCredentialsResponse {
    pub message: String,
    pub username: String,
}

#[derive(Deserialize, IntoParams)]
pub struct OidcLoginParams {
    /// Local path to return to after login
    pub return_to: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct OidcCallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// Log in with local credentials
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = SessionInfo),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<SessionInfo>> {
    let principal = state
        .services
        .auth
        .validate_credentials(&req.username, &req.password)
        .await?
        .ok_or(AppError::Unauthorized)?;

    services::session::create_session(&session, &principal).await?;

    Ok(Json(SessionInfo {
        username: principal.username,
        is_valid: true,
    }))
}

/// Log out and destroy the session
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Session destroyed", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(session: Session) -> AppResult<Json<MessageResponse>> {
    services::session::destroy_session(&session).await?;
    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Report the current session's validity
#[utoipa::path(
    get,
    path = "/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Session is valid", body = SessionInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn session_info(session: Session) -> AppResult<Json<SessionInfo>> {
    let info = services::session::session_info(&session).await?;
    Ok(Json(info))
}

/// Change the admin username and/or password
#[utoipa::path(
    put,
    path = "/auth/credentials",
    tag = "auth",
    request_body = ChangeCredentialsRequest,
    responses(
        (status = 200, description = "Credentials updated", body = ChangeCredentialsResponse),
        (status = 400, description = "Nothing to change or blank value"),
        (status = 401, description = "Not authenticated or wrong current password"),
        (status = 409, description = "Username already in use")
    )
)]
pub async fn change_credentials(
    State(state): State<crate::AppState>,
    session: Session,
    CurrentAdmin(principal): CurrentAdmin,
    Json(req): Json<ChangeCredentialsRequest>,
) -> AppResult<Json<ChangeCredentialsResponse>> {
    let updated = state
        .services
        .auth
        .change_credentials(
            &session,
            &principal,
            ChangeCredentials {
                current_password: req.current_password,
                new_username: req.new_username,
                new_password: req.new_password,
            },
        )
        .await?;

    Ok(Json(ChangeCredentialsResponse {
        message: "Credentials updated".to_string(),
        username: updated.username,
    }))
}

/// Start the identity-provider login
#[utoipa::path(
    get,
    path = "/auth/oidc/login",
    tag = "auth",
    params(OidcLoginParams),
    responses(
        (status = 303, description = "Redirect to the provider's authorization endpoint"),
        (status = 400, description = "Identity provider not configured")
    )
)]
pub async fn oidc_login(
    State(state): State<crate::AppState>,
    session: Session,
    Query(params): Query<OidcLoginParams>,
) -> AppResult<Redirect> {
    let oidc = state.services.oidc.as_ref().ok_or_else(|| {
        AppError::Validation("Identity provider login is not configured".to_string())
    })?;

    let url = oidc
        .login_start(&session, params.return_to.as_deref())
        .await?;
    Ok(Redirect::to(&url))
}

/// Complete the identity-provider login
#[utoipa::path(
    get,
    path = "/auth/oidc/callback",
    tag = "auth",
    params(OidcCallbackParams),
    responses(
        (status = 303, description = "Redirect to the post-login path"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn oidc_callback(
    State(state): State<crate::AppState>,
    session: Session,
    Query(params): Query<OidcCallbackParams>,
) -> AppResult<Redirect> {
    let oidc = state.services.oidc.as_ref().ok_or_else(|| {
        AppError::Validation("Identity provider login is not configured".to_string())
    })?;

    let code = params.code.as_deref().unwrap_or("");
    let state_param = params.state.as_deref().unwrap_or("");

    let (principal, return_path) = oidc.callback(&session, code, state_param).await?;
    services::session::create_session(&session, &principal).await?;

    Ok(Redirect::to(&return_path))
}
