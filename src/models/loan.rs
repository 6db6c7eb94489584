//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::device::DeviceStatus;

/// Loan record from database. A row with `returned_at = NULL` is open.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: Uuid,
    pub device_id: Uuid,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub return_note: Option<String>,
}

/// Currently-open loan as shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OpenLoan {
    pub loan_id: Uuid,
    pub device_id: Uuid,
    pub call_sign: String,
    pub device_type: String,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
}

/// Historical loan row joined with its device
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct HistoryEntry {
    pub loan_id: Uuid,
    pub borrower_name: String,
    pub borrowed_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub return_note: Option<String>,
    pub device_id: Uuid,
    pub call_sign: String,
    pub device_type: String,
    pub status: DeviceStatus,
    pub serial_number: Option<String>,
}

/// Borrower name suggestion for input assistance. Advisory only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowerSuggestion {
    pub borrower_name: String,
    pub last_borrowed_at: DateTime<Utc>,
}

/// Dashboard aggregate: status counts plus the currently-open loans, read
/// as one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub available: i64,
    pub on_loan: i64,
    pub defect: i64,
    pub maintenance: i64,
    /// Up to 50 open loans, most recent borrow first
    pub open_loans: Vec<OpenLoan>,
}

/// One page of loan history
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryPage {
    pub entries: Vec<HistoryEntry>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    /// ceil(total / page_size); 0 when the result set is empty
    pub total_pages: i64,
}
