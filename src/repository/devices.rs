//! Devices repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::tx_scope;
use crate::{
    error::{AppError, AppResult},
    models::device::{CreateDevice, Device, DeviceStatus, UpdateDevice},
};

/// Default page size for device listings
pub const DEFAULT_TAKE: i64 = 100;
/// Hard cap on the device listing page size
pub const MAX_TAKE: i64 = 200;

/// Clamp listing bounds: take lands in [1, MAX_TAKE], skip is floored at
/// zero.
fn clamp_page(take: Option<i64>, skip: Option<i64>) -> (i64, i64) {
    (
        take.unwrap_or(DEFAULT_TAKE).clamp(1, MAX_TAKE),
        skip.unwrap_or(0).max(0),
    )
}

#[derive(Clone)]
pub struct DevicesRepository {
    pool: Pool<Postgres>,
}

impl DevicesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get device by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Device> {
        sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))
    }

    /// List devices, optionally restricted to one status.
    ///
    /// `take` is clamped to [1, MAX_TAKE], `skip` floored at zero. Ordered
    /// by status then call sign so operators get a stable, scan-friendly
    /// grouping by lifecycle state.
    pub async fn find_all(
        &self,
        status: Option<DeviceStatus>,
        take: Option<i64>,
        skip: Option<i64>,
    ) -> AppResult<Vec<Device>> {
        let (take, skip) = clamp_page(take, skip);

        let devices = if let Some(status) = status {
            sqlx::query_as::<_, Device>(
                r#"
                SELECT * FROM devices WHERE status = $1
                ORDER BY status, call_sign
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(status)
            .bind(take)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Device>(
                r#"
                SELECT * FROM devices
                ORDER BY status, call_sign
                LIMIT $1 OFFSET $2
                "#,
            )
            .bind(take)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(devices)
    }

    /// Create a device. Runs in a transaction so its failure semantics match
    /// update/delete.
    pub async fn create(&self, data: &CreateDevice) -> AppResult<Device> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let device = sqlx::query_as::<_, Device>(
                r#"
                INSERT INTO devices (call_sign, serial_number, device_type, notes)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(&data.call_sign)
            .bind(&data.serial_number)
            .bind(&data.device_type)
            .bind(&data.notes)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match AppError::from(e) {
                AppError::Conflict(_) => {
                    AppError::Conflict("A device with this call sign already exists".to_string())
                }
                other => other,
            })?;

            tx.commit().await?;
            Ok(device)
        })
        .await
    }

    /// Apply a partial update. Only fields present in the input are written;
    /// double-option fields write NULL when explicitly cleared.
    pub async fn update(&self, id: Uuid, data: &UpdateDevice) -> AppResult<Device> {
        let now = Utc::now();
        let mut sets = vec!["updated_at = $1".to_string()];
        let mut idx = 2;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.call_sign, "call_sign");
        add_field!(data.device_type, "device_type");
        add_field!(data.serial_number, "serial_number");
        add_field!(data.notes, "notes");

        let query = format!(
            "UPDATE devices SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let mut builder = sqlx::query_as::<_, Device>(&query).bind(now);

            macro_rules! bind_field {
                ($field:expr) => {
                    if let Some(ref val) = $field {
                        builder = builder.bind(val);
                    }
                };
            }

            bind_field!(data.call_sign);
            bind_field!(data.device_type);
            bind_field!(data.serial_number);
            bind_field!(data.notes);

            let device = builder
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| match AppError::from(e) {
                    AppError::Conflict(_) => {
                        AppError::Conflict("A device with this call sign already exists".to_string())
                    }
                    other => other,
                })?
                .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

            tx.commit().await?;
            Ok(device)
        })
        .await
    }

    /// Write a new status. The service layer has already rejected ON_LOAN
    /// as a target; this is a plain transactional write.
    pub async fn update_status(&self, id: Uuid, status: DeviceStatus) -> AppResult<Device> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let device = sqlx::query_as::<_, Device>(
                "UPDATE devices SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
            )
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

            tx.commit().await?;
            Ok(device)
        })
        .await
    }

    /// Delete a device and its loan history.
    ///
    /// Read-then-act runs inside one transaction with the row locked, so a
    /// concurrent borrow cannot slip between the status check and the
    /// delete. Loan rows go first; a failure mid-cascade rolls back and
    /// leaves no orphaned device.
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Device {} not found", id)))?;

            if device.status == DeviceStatus::OnLoan && !force {
                return Err(AppError::Conflict(
                    "Cannot delete a device that is on loan".to_string(),
                ));
            }

            sqlx::query("DELETE FROM loans WHERE device_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            sqlx::query("DELETE FROM devices WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_page, DEFAULT_TAKE, MAX_TAKE};

    #[test]
    fn take_defaults_and_is_capped() {
        assert_eq!(clamp_page(None, None), (DEFAULT_TAKE, 0));
        assert_eq!(clamp_page(Some(10_000), None), (MAX_TAKE, 0));
        assert_eq!(clamp_page(Some(25), None), (25, 0));
    }

    #[test]
    fn take_below_one_is_floored() {
        assert_eq!(clamp_page(Some(0), None).0, 1);
        assert_eq!(clamp_page(Some(-7), None).0, 1);
    }

    #[test]
    fn negative_skip_is_treated_as_zero() {
        assert_eq!(clamp_page(None, Some(-5)).1, 0);
        assert_eq!(clamp_page(None, Some(40)).1, 40);
    }
}
