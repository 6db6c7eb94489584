//! Ledger reader: dashboard aggregates, loan history, borrower suggestions,
//! and the loan desk operations that feed them

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        device::Device,
        loan::{BorrowerSuggestion, DashboardStats, HistoryPage, Loan},
    },
    repository::{loans::HistoryFilter, Repository},
};

/// Default history page size
pub const HISTORY_DEFAULT_PAGE_SIZE: i64 = 100;
/// Hard cap on the history page size
pub const HISTORY_MAX_PAGE_SIZE: i64 = 500;
/// Longest allowed from..to span
pub const HISTORY_MAX_SPAN_DAYS: i64 = 365;

/// Default number of borrower suggestions
pub const SUGGESTIONS_DEFAULT_LIMIT: i64 = 10;
/// Hard cap on borrower suggestions
pub const SUGGESTIONS_MAX_LIMIT: i64 = 50;

/// Raw history query as received from the caller
#[derive(Debug, Default)]
pub struct HistoryParams {
    pub device_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

fn parse_timestamp(value: &str, field: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{} must be an RFC 3339 timestamp", field)))
}

/// Validate a raw history query into a filter, before any store access.
///
/// The inverted-range and oversized-span cases are checked together and
/// reported as one combined message.
fn validate_history_params(params: &HistoryParams) -> AppResult<HistoryFilter> {
    let device_id = params
        .device_id
        .as_deref()
        .map(|raw| {
            Uuid::parse_str(raw)
                .map_err(|_| AppError::Validation("deviceId must be a valid identifier".to_string()))
        })
        .transpose()?;

    let from = params
        .from
        .as_deref()
        .map(|raw| parse_timestamp(raw, "from"))
        .transpose()?;
    let to = params
        .to
        .as_deref()
        .map(|raw| parse_timestamp(raw, "to"))
        .transpose()?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to || to.signed_duration_since(from) > Duration::days(HISTORY_MAX_SPAN_DAYS) {
            return Err(AppError::Validation(format!(
                "Date range is invalid: 'from' must precede 'to' and the span must not exceed {} days",
                HISTORY_MAX_SPAN_DAYS
            )));
        }
    }

    let page = params.page.unwrap_or(1);
    let page_size = params.page_size.unwrap_or(HISTORY_DEFAULT_PAGE_SIZE);
    if page < 1 || page_size < 1 {
        return Err(AppError::Validation(
            "page and pageSize must be at least 1".to_string(),
        ));
    }

    Ok(HistoryFilter {
        device_id,
        from,
        to,
        page,
        page_size: page_size.min(HISTORY_MAX_PAGE_SIZE),
    })
}

#[derive(Clone)]
pub struct LedgerService {
    repository: Repository,
}

impl LedgerService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a device for a named borrower
    pub async fn borrow(&self, device_id: Uuid, borrower_name: &str) -> AppResult<(Loan, Device)> {
        if borrower_name.trim().is_empty() {
            return Err(AppError::Validation(
                "Borrower name must not be blank".to_string(),
            ));
        }
        self.repository
            .loans
            .borrow(device_id, borrower_name.trim())
            .await
    }

    /// Return an open loan
    pub async fn return_loan(
        &self,
        loan_id: Uuid,
        note: Option<&str>,
    ) -> AppResult<(Loan, Device)> {
        let note = note.map(str::trim).filter(|n| !n.is_empty());
        self.repository.loans.return_loan(loan_id, note).await
    }

    /// One consistent snapshot of status counts and open loans
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        self.repository.loans.dashboard().await
    }

    /// Paginated, filtered loan history
    pub async fn history(&self, params: &HistoryParams) -> AppResult<HistoryPage> {
        let filter = validate_history_params(params)?;
        let (entries, total) = self.repository.loans.history(&filter).await?;

        let total_pages = if total == 0 {
            0
        } else {
            (total + filter.page_size - 1) / filter.page_size
        };

        Ok(HistoryPage {
            entries,
            total,
            page: filter.page,
            page_size: filter.page_size,
            total_pages,
        })
    }

    /// Borrower name suggestions. Advisory input assistance only; a blank
    /// query yields nothing without touching the store.
    pub async fn suggestions(
        &self,
        query: &str,
        limit: Option<i64>,
    ) -> AppResult<Vec<BorrowerSuggestion>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit
            .unwrap_or(SUGGESTIONS_DEFAULT_LIMIT)
            .clamp(1, SUGGESTIONS_MAX_LIMIT);
        self.repository.loans.suggestions(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(from: Option<&str>, to: Option<&str>) -> HistoryParams {
        HistoryParams {
            from: from.map(String::from),
            to: to.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_to_first_page_of_one_hundred() {
        let filter = validate_history_params(&HistoryParams::default()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.page_size, HISTORY_DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn rejects_malformed_device_id() {
        let p = HistoryParams {
            device_id: Some("not-a-uuid".into()),
            ..Default::default()
        };
        assert!(matches!(
            validate_history_params(&p),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_malformed_timestamps() {
        let result = validate_history_params(&params(Some("yesterday"), None));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_inverted_range() {
        let result = validate_history_params(&params(
            Some("2026-02-01T00:00:00Z"),
            Some("2026-01-01T00:00:00Z"),
        ));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_span_over_a_year() {
        let result = validate_history_params(&params(
            Some("2025-01-01T00:00:00Z"),
            Some("2026-01-02T00:00:00Z"),
        ));
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn accepts_span_of_exactly_365_days() {
        let filter = validate_history_params(&params(
            Some("2025-01-01T00:00:00Z"),
            Some("2026-01-01T00:00:00Z"),
        ))
        .unwrap();
        assert!(filter.from.is_some() && filter.to.is_some());
    }

    #[test]
    fn rejects_page_and_page_size_below_one() {
        for (page, page_size) in [(Some(0), None), (None, Some(0)), (Some(-1), Some(-5))] {
            let p = HistoryParams {
                page,
                page_size,
                ..Default::default()
            };
            assert!(matches!(
                validate_history_params(&p),
                Err(AppError::Validation(_))
            ));
        }
    }

    #[test]
    fn caps_page_size() {
        let p = HistoryParams {
            page_size: Some(10_000),
            ..Default::default()
        };
        let filter = validate_history_params(&p).unwrap();
        assert_eq!(filter.page_size, HISTORY_MAX_PAGE_SIZE);
    }
}
