//! Admin accounts repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::tx_scope;
use crate::{
    error::{AppError, AppResult},
    models::admin::AdminAccount,
};

#[derive(Clone)]
pub struct AdminsRepository {
    pool: Pool<Postgres>,
}

impl AdminsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get admin account by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<AdminAccount> {
        sqlx::query_as::<_, AdminAccount>("SELECT * FROM admin_accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Admin account not found".to_string()))
    }

    /// Get admin account by username
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<AdminAccount>> {
        let account = sqlx::query_as::<_, AdminAccount>(
            "SELECT * FROM admin_accounts WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Whether any admin account exists (bootstrap check)
    pub async fn exists_any(&self) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admin_accounts)")
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create an admin account
    pub async fn create(&self, username: &str, password_hash: &str) -> AppResult<AdminAccount> {
        let account = sqlx::query_as::<_, AdminAccount>(
            r#"
            INSERT INTO admin_accounts (username, password_hash)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict("Username already in use".to_string()),
            other => other,
        })?;

        Ok(account)
    }

    /// Update username and/or password hash.
    ///
    /// Uniqueness is not pre-checked: the UNIQUE constraint reports the
    /// violation from the write itself, which keeps the change race-safe.
    pub async fn update_credentials(
        &self,
        id: Uuid,
        new_username: Option<&str>,
        new_password_hash: Option<&str>,
    ) -> AppResult<AdminAccount> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        if new_username.is_some() {
            sets.push(format!("username = ${}", idx));
            idx += 1;
        }
        if new_password_hash.is_some() {
            sets.push(format!("password_hash = ${}", idx));
            idx += 1;
        }

        let query = format!(
            "UPDATE admin_accounts SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let mut builder = sqlx::query_as::<_, AdminAccount>(&query).bind(now);
            if let Some(username) = new_username {
                builder = builder.bind(username);
            }
            if let Some(hash) = new_password_hash {
                builder = builder.bind(hash);
            }

            let account = builder
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| match AppError::from(e) {
                    AppError::Conflict(_) => {
                        AppError::Conflict("Username already in use".to_string())
                    }
                    other => other,
                })?
                .ok_or_else(|| AppError::NotFound("Admin account not found".to_string()))?;

            tx.commit().await?;
            Ok(account)
        })
        .await
    }
}
