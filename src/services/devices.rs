//! Device inventory service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::device::{CreateDevice, Device, DeviceStatus, UpdateDevice},
    repository::Repository,
};

/// Reject a blank required field before any store access
fn require_non_blank(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

#[derive(Clone)]
pub struct DeviceService {
    repository: Repository,
}

impl DeviceService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create a device (status defaults to AVAILABLE)
    pub async fn create(&self, data: &CreateDevice) -> AppResult<Device> {
        require_non_blank(&data.call_sign, "Call sign")?;
        require_non_blank(&data.device_type, "Device type")?;
        self.repository.devices.create(data).await
    }

    /// Apply a partial update. Required fields may be replaced but not
    /// blanked.
    pub async fn update(&self, id: Uuid, data: &UpdateDevice) -> AppResult<Device> {
        if let Some(ref call_sign) = data.call_sign {
            require_non_blank(call_sign, "Call sign")?;
        }
        if let Some(ref device_type) = data.device_type {
            require_non_blank(device_type, "Device type")?;
        }
        self.repository.devices.update(id, data).await
    }

    /// Transition a device between the directly settable statuses.
    ///
    /// ON_LOAN is rejected here, before any store access; it is entered
    /// only through the loan desk together with its loan row.
    pub async fn update_status(&self, id: Uuid, status: DeviceStatus) -> AppResult<Device> {
        if status == DeviceStatus::OnLoan {
            return Err(AppError::Validation(
                "Status ON_LOAN cannot be set directly; it is managed by the loan desk".to_string(),
            ));
        }
        self.repository.devices.update_status(id, status).await
    }

    /// Delete a device and its loan history. Refused while the device is
    /// on loan unless `force` is set.
    pub async fn delete(&self, id: Uuid, force: bool) -> AppResult<()> {
        self.repository.devices.delete(id, force).await
    }

    pub async fn find_all(
        &self,
        status: Option<DeviceStatus>,
        take: Option<i64>,
        skip: Option<i64>,
    ) -> AppResult<Vec<Device>> {
        self.repository.devices.find_all(status, take, skip).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Device> {
        self.repository.devices.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::require_non_blank;

    #[test]
    fn blank_fields_are_rejected() {
        assert!(require_non_blank("", "Call sign").is_err());
        assert!(require_non_blank("   ", "Call sign").is_err());
        assert!(require_non_blank("\t\n", "Device type").is_err());
    }

    #[test]
    fn non_blank_fields_pass() {
        assert!(require_non_blank("F-21", "Call sign").is_ok());
        assert!(require_non_blank("Handheld", "Device type").is_ok());
    }
}
