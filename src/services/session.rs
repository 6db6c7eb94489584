//! Session authenticator: the single gate in front of every non-public
//! operation.
//!
//! The session is an explicit value threaded through each operation, never
//! ambient state; authorization is a pure function of what the session
//! store resolved for the request.

use serde::Serialize;
use tower_sessions::Session;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::admin::Principal,
};

/// Session keys for the authenticated principal
pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
pub const IS_ADMIN_KEY: &str = "is_admin";

/// Session validity report
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    pub username: String,
    pub is_valid: bool,
}

fn store_failure(err: tower_sessions::session::Error) -> AppError {
    AppError::OperationFailed(format!("session store: {}", err))
}

/// Authorize a request against its session.
///
/// Valid only when the stored user id is a non-empty, non-whitespace string
/// AND the admin flag is strictly true. Every other shape collapses into
/// the one uniform Unauthorized, so a caller cannot tell which field was
/// wrong.
pub async fn authorize(session: &Session) -> AppResult<Principal> {
    let user_id: Option<String> = session.get(USER_ID_KEY).await.map_err(store_failure)?;
    let username: Option<String> = session.get(USERNAME_KEY).await.map_err(store_failure)?;
    let is_admin: Option<bool> = session.get(IS_ADMIN_KEY).await.map_err(store_failure)?;

    match (user_id, is_admin) {
        (Some(user_id), Some(true)) if !user_id.trim().is_empty() => Ok(Principal {
            user_id,
            username: username.unwrap_or_default(),
        }),
        _ => Err(AppError::Unauthorized),
    }
}

/// Establish an authenticated session for a verified principal.
///
/// The session id is cycled before any principal data is written: if the
/// regeneration fails the old session is left untouched, so identity never
/// lands in a token an attacker could have fixed in advance. The write is
/// followed by an explicit save; a save failure fails the whole operation.
pub async fn create_session(session: &Session, principal: &Principal) -> AppResult<()> {
    session.cycle_id().await.map_err(store_failure)?;

    session
        .insert(USER_ID_KEY, &principal.user_id)
        .await
        .map_err(store_failure)?;
    session
        .insert(USERNAME_KEY, &principal.username)
        .await
        .map_err(store_failure)?;
    session
        .insert(IS_ADMIN_KEY, true)
        .await
        .map_err(store_failure)?;

    session.save().await.map_err(store_failure)?;
    Ok(())
}

/// Invalidate the server-side session record. Failures are reported, not
/// swallowed.
pub async fn destroy_session(session: &Session) -> AppResult<()> {
    session.flush().await.map_err(store_failure)
}

/// Same check as [`authorize`], reported as a validity record.
pub async fn session_info(session: &Session) -> AppResult<SessionInfo> {
    let principal = authorize(session).await?;
    Ok(SessionInfo {
        username: principal.username,
        is_valid: true,
    })
}
