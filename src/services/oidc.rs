//! Identity-provider bridge (OpenID Connect authorization code flow)
//!
//! Exchanges an authorization code for a token and a user profile, then
//! maps the external identity onto the same session contract local login
//! produces. Every rejection in the flow collapses to the uniform
//! Unauthorized; the internal reason is logged, never returned.

use rand::{distributions::Alphanumeric, Rng};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    config::OidcConfig,
    error::{AppError, AppResult},
    models::admin::Principal,
};

/// Transient session keys used only during the handshake
const STATE_KEY: &str = "oidc_state";
const RETURN_TO_KEY: &str = "oidc_return_to";

#[derive(Debug, Clone, Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: String,
    token_endpoint: String,
    userinfo_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UserProfile {
    sub: Option<String>,
    preferred_username: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

/// Post-login redirect paths must be local: anything not starting with "/"
/// falls back to the root.
fn sanitize_return_path(return_to: Option<&str>) -> String {
    match return_to {
        Some(path) if path.starts_with('/') => path.to_string(),
        _ => "/".to_string(),
    }
}

/// Display name candidates in priority order; the subject is the last
/// resort. `None` means the profile is unusable.
fn pick_display_name(profile: &UserProfile) -> Option<String> {
    [
        &profile.preferred_username,
        &profile.name,
        &profile.email,
        &profile.sub,
    ]
    .into_iter()
    .flatten()
    .find(|candidate| !candidate.trim().is_empty())
    .cloned()
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn store_failure(err: tower_sessions::session::Error) -> AppError {
    AppError::OperationFailed(format!("session store: {}", err))
}

#[derive(Clone)]
pub struct OidcService {
    http: reqwest::Client,
    config: OidcConfig,
    discovery: DiscoveryDocument,
}

impl OidcService {
    /// Fetch the provider's discovery document and build the bridge
    pub async fn discover(config: OidcConfig) -> AppResult<Self> {
        let http = reqwest::Client::new();
        let url = format!(
            "{}/.well-known/openid-configuration",
            config.issuer_url.trim_end_matches('/')
        );

        let discovery = http
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::OperationFailed(format!("OIDC discovery failed: {}", e)))?
            .json::<DiscoveryDocument>()
            .await
            .map_err(|e| AppError::OperationFailed(format!("OIDC discovery failed: {}", e)))?;

        Ok(Self {
            http,
            config,
            discovery,
        })
    }

    /// Start the login: store a single-use state and the sanitized return
    /// path in the session, persist it, and hand back the authorization
    /// URL to redirect to.
    pub async fn login_start(
        &self,
        session: &Session,
        return_to: Option<&str>,
    ) -> AppResult<String> {
        let state = random_state();
        let return_path = sanitize_return_path(return_to);

        session
            .insert(STATE_KEY, &state)
            .await
            .map_err(store_failure)?;
        session
            .insert(RETURN_TO_KEY, &return_path)
            .await
            .map_err(store_failure)?;
        session.save().await.map_err(store_failure)?;

        let url = reqwest::Url::parse_with_params(
            &self.discovery.authorization_endpoint,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("scope", "openid profile email"),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| AppError::OperationFailed(format!("bad authorization endpoint: {}", e)))?;

        Ok(url.to_string())
    }

    /// Complete the login: check the state, exchange the code, fetch the
    /// profile, and produce the principal plus the post-login path.
    pub async fn callback(
        &self,
        session: &Session,
        code: &str,
        state: &str,
    ) -> AppResult<(Principal, String)> {
        // The stored state is single-use: consume it before any check.
        let expected: Option<String> = session.remove(STATE_KEY).await.map_err(store_failure)?;
        let return_path: String = session
            .remove::<String>(RETURN_TO_KEY)
            .await
            .map_err(store_failure)?
            .unwrap_or_else(|| "/".to_string());

        let expected = match expected {
            Some(s) if !s.is_empty() => s,
            _ => {
                tracing::debug!("OIDC callback without a stored state");
                return Err(AppError::Unauthorized);
            }
        };
        if code.is_empty() || state != expected {
            tracing::debug!("OIDC callback state mismatch or missing code");
            return Err(AppError::Unauthorized);
        }

        let token = self
            .http
            .post(&self.discovery.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::debug!("OIDC token exchange failed: {}", e);
                AppError::Unauthorized
            })?
            .json::<TokenResponse>()
            .await
            .map_err(|e| {
                tracing::debug!("OIDC token response unreadable: {}", e);
                AppError::Unauthorized
            })?;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                tracing::debug!("OIDC token exchange returned no access token");
                AppError::Unauthorized
            })?;

        let profile = self
            .http
            .get(&self.discovery.userinfo_endpoint)
            .bearer_auth(&access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                tracing::debug!("OIDC user-info fetch failed: {}", e);
                AppError::Unauthorized
            })?
            .json::<UserProfile>()
            .await
            .map_err(|e| {
                tracing::debug!("OIDC user-info response unreadable: {}", e);
                AppError::Unauthorized
            })?;

        let username = pick_display_name(&profile).ok_or_else(|| {
            tracing::debug!("OIDC profile has neither subject nor display name");
            AppError::Unauthorized
        })?;
        let user_id = profile.sub.clone().unwrap_or_else(|| username.clone());

        Ok((Principal { user_id, username }, return_path))
    }
}

#[cfg(test)]
mod tests {
    use super::{pick_display_name, sanitize_return_path, UserProfile};

    #[test]
    fn return_path_must_be_local() {
        assert_eq!(sanitize_return_path(Some("/devices")), "/devices");
        assert_eq!(sanitize_return_path(Some("https://evil.example")), "/");
        assert_eq!(sanitize_return_path(Some("")), "/");
        assert_eq!(sanitize_return_path(None), "/");
    }

    #[test]
    fn display_name_candidates_tried_in_order() {
        let profile = UserProfile {
            sub: Some("sub-1".into()),
            preferred_username: Some("preferred".into()),
            name: Some("Full Name".into()),
            email: Some("a@b.example".into()),
        };
        assert_eq!(pick_display_name(&profile).as_deref(), Some("preferred"));

        let profile = UserProfile {
            preferred_username: None,
            ..profile
        };
        assert_eq!(pick_display_name(&profile).as_deref(), Some("Full Name"));
    }

    #[test]
    fn subject_is_last_resort() {
        let profile = UserProfile {
            sub: Some("sub-1".into()),
            ..Default::default()
        };
        assert_eq!(pick_display_name(&profile).as_deref(), Some("sub-1"));
    }

    #[test]
    fn empty_profile_is_rejected() {
        assert!(pick_display_name(&UserProfile::default()).is_none());
    }
}
