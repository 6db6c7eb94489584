//! Device model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Lifecycle status of a device
///
/// ON_LOAN is owned by the loan desk: it is never a legal target for a
/// direct status update and is entered/left only together with a loan row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "device_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Available,
    OnLoan,
    Defect,
    Maintenance,
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DeviceStatus::Available => "AVAILABLE",
            DeviceStatus::OnLoan => "ON_LOAN",
            DeviceStatus::Defect => "DEFECT",
            DeviceStatus::Maintenance => "MAINTENANCE",
        };
        write!(f, "{}", label)
    }
}

/// Device record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Device {
    pub id: Uuid,
    /// Call sign, unique across the fleet
    pub call_sign: String,
    pub serial_number: Option<String>,
    /// Device category (e.g. "Handheld", "Mobile", "Base station")
    pub device_type: String,
    pub notes: Option<String>,
    pub status: DeviceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create device request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDevice {
    pub call_sign: String,
    pub serial_number: Option<String>,
    pub device_type: String,
    pub notes: Option<String>,
}

/// Partial device update.
///
/// `serial_number` and `notes` are tri-state: absent leaves the column
/// untouched, `null` clears it, a string sets it. `call_sign` and
/// `device_type` are required columns and can only be replaced, never
/// cleared.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDevice {
    pub call_sign: Option<String>,
    pub device_type: Option<String>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub serial_number: Option<Option<String>>,
    #[serde(default, with = "serde_with::rust::double_option")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
}

/// Status update request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateDeviceStatus {
    pub status: DeviceStatus,
}

/// Query parameters for device listing
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeviceQuery {
    /// Restrict to one status
    pub status: Option<DeviceStatus>,
    /// Maximum number of rows to return
    pub take: Option<i64>,
    /// Number of rows to skip
    pub skip: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::UpdateDevice;

    #[test]
    fn absent_and_cleared_fields_are_distinguishable() {
        let update: UpdateDevice = serde_json::from_str(r#"{"call_sign": "F-21"}"#).unwrap();
        assert_eq!(update.call_sign.as_deref(), Some("F-21"));
        assert!(update.notes.is_none(), "absent field must stay untouched");

        let update: UpdateDevice = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        assert_eq!(update.notes, Some(None), "null must mean an explicit clear");

        let update: UpdateDevice = serde_json::from_str(r#"{"notes": "spare battery"}"#).unwrap();
        assert_eq!(update.notes, Some(Some("spare battery".to_string())));
    }
}
