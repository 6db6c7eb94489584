//! Repository layer for database operations

pub mod admins;
pub mod devices;
pub mod loans;

use std::future::Future;
use std::time::Duration;

use sqlx::{Pool, Postgres};

use crate::error::{AppError, AppResult};

/// Deadline for a single store transaction
pub const TX_DEADLINE: Duration = Duration::from_secs(10);

/// Run a transactional operation under the store deadline.
///
/// The operation acquires its transaction handle inside the future, so a
/// deadline expiry drops the handle and the store rolls back; expiry is
/// surfaced as the distinct `Timeout` kind instead of the generic failure.
/// Errors already classified as an `AppError` pass through unchanged.
pub(crate) async fn tx_scope<T, F>(op: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(TX_DEADLINE, op).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout),
    }
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub devices: devices::DevicesRepository,
    pub loans: loans::LoansRepository,
    pub admins: admins::AdminsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            devices: devices::DevicesRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            admins: admins::AdminsRepository::new(pool.clone()),
            pool,
        }
    }
}
