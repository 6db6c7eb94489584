//! Credential verification and credential management

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::admin::{AdminAccount, Principal},
    repository::Repository,
    services::session::USERNAME_KEY,
};

/// Credential change request, passed through from the API layer
#[derive(Debug)]
pub struct ChangeCredentials {
    pub current_password: String,
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    hasher: Argon2<'static>,
    /// Hash of a throwaway password at the configured cost. Unknown-username
    /// lookups verify against this so their latency matches a real
    /// wrong-password check.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> AppResult<Self> {
        let params = Params::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
            None,
        )
        .map_err(|e| AppError::OperationFailed(format!("invalid argon2 parameters: {}", e)))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = hasher
            .hash_password(b"radiopool-timing-equalizer", &salt)
            .map_err(|e| AppError::OperationFailed(format!("failed to prepare dummy hash: {}", e)))?
            .to_string();

        Ok(Self {
            repository,
            config,
            hasher,
            dummy_hash,
        })
    }

    /// Hash a password at the configured cost
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .hasher
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::OperationFailed(format!("failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn verify_against(&self, hash: &str, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|_| AppError::OperationFailed("stored password hash is malformed".to_string()))?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Verify a username/password pair.
    ///
    /// The hash comparison runs whether or not the username exists — against
    /// the real hash when found, against the equal-cost dummy hash when not —
    /// so response latency does not reveal which usernames are real. Returns
    /// the principal only on found + verified; both failure modes are `None`.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AppResult<Option<Principal>> {
        let account = self.repository.admins.get_by_username(username).await?;

        let hash = account
            .as_ref()
            .map(|a| a.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let verified = self.verify_against(hash, password)?;

        match account {
            Some(account) if verified => Ok(Some(Principal {
                user_id: account.id.to_string(),
                username: account.username,
            })),
            _ => Ok(None),
        }
    }

    /// Change the admin's username and/or password.
    ///
    /// Re-verifies the current password before touching anything. Username
    /// uniqueness is enforced by the write itself (UNIQUE constraint), not
    /// a prior read. On a username change the live session is updated and
    /// saved so the new name is visible without re-login.
    pub async fn change_credentials(
        &self,
        session: &Session,
        principal: &Principal,
        req: ChangeCredentials,
    ) -> AppResult<AdminAccount> {
        if req.new_username.is_none() && req.new_password.is_none() {
            return Err(AppError::Validation(
                "Supply a new username, a new password, or both".to_string(),
            ));
        }
        if let Some(ref username) = req.new_username {
            if username.trim().is_empty() {
                return Err(AppError::Validation("Username must not be blank".to_string()));
            }
        }
        if let Some(ref password) = req.new_password {
            if password.is_empty() {
                return Err(AppError::Validation("Password must not be empty".to_string()));
            }
        }

        let id = Uuid::parse_str(&principal.user_id).map_err(|_| AppError::Unauthorized)?;
        let account = self.repository.admins.get_by_id(id).await?;

        if !self.verify_against(&account.password_hash, &req.current_password)? {
            return Err(AppError::Unauthorized);
        }

        let username_change = req
            .new_username
            .filter(|username| username != &account.username);
        let new_hash = req
            .new_password
            .as_deref()
            .map(|password| self.hash_password(password))
            .transpose()?;

        let updated = self
            .repository
            .admins
            .update_credentials(account.id, username_change.as_deref(), new_hash.as_deref())
            .await?;

        if username_change.is_some() {
            session
                .insert(USERNAME_KEY, &updated.username)
                .await
                .map_err(|e| AppError::OperationFailed(format!("session store: {}", e)))?;
            session
                .save()
                .await
                .map_err(|e| AppError::OperationFailed(format!("session store: {}", e)))?;
        }

        Ok(updated)
    }

    /// Create the admin account from configuration when none exists yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        if self.repository.admins.exists_any().await? {
            return Ok(());
        }

        let hash = self.hash_password(&self.config.bootstrap_password)?;
        self.repository
            .admins
            .create(&self.config.bootstrap_username, &hash)
            .await?;
        tracing::info!(
            "Created bootstrap admin account '{}'",
            self.config.bootstrap_username
        );
        Ok(())
    }
}
