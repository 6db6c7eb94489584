//! Administrator account and session principal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Administrator account with local credentials.
///
/// The password hash stays in this struct and is never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct AdminAccount {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authenticated identity carried through a request once the session
/// check has passed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
}
