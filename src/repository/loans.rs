//! Loans repository: loan desk, dashboard snapshot, history and the
//! borrower suggestion index

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::tx_scope;
use crate::{
    error::{AppError, AppResult},
    models::{
        device::{Device, DeviceStatus},
        loan::{BorrowerSuggestion, DashboardStats, HistoryEntry, Loan, OpenLoan},
    },
};

/// Open loans shown on the dashboard
const DASHBOARD_OPEN_LOANS: i64 = 50;

/// Validated history filter, built by the ledger service
#[derive(Debug, Clone)]
pub struct HistoryFilter {
    pub device_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: i64,
    pub page_size: i64,
}

/// Escape the store's pattern-match wildcards so user input matches
/// literally inside a LIKE pattern.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Borrow a device: create the loan row and move the device to ON_LOAN
    /// in one transaction. The device row is locked for the duration so the
    /// availability check cannot race a concurrent borrow or delete.
    pub async fn borrow(&self, device_id: Uuid, borrower_name: &str) -> AppResult<(Loan, Device)> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let device = sqlx::query_as::<_, Device>("SELECT * FROM devices WHERE id = $1 FOR UPDATE")
                .bind(device_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Device {} not found", device_id)))?;

            if device.status != DeviceStatus::Available {
                return Err(AppError::Conflict(format!(
                    "Device {} is not available for loan",
                    device.call_sign
                )));
            }

            let loan = sqlx::query_as::<_, Loan>(
                r#"
                INSERT INTO loans (device_id, borrower_name, borrowed_at)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(device_id)
            .bind(borrower_name)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

            let device = sqlx::query_as::<_, Device>(
                "UPDATE devices SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
            )
            .bind(DeviceStatus::OnLoan)
            .bind(Utc::now())
            .bind(device_id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok((loan, device))
        })
        .await
    }

    /// Close an open loan and release its device back to AVAILABLE, in one
    /// transaction.
    pub async fn return_loan(&self, loan_id: Uuid, note: Option<&str>) -> AppResult<(Loan, Device)> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let loan = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
                .bind(loan_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Loan {} not found", loan_id)))?;

            if loan.returned_at.is_some() {
                return Err(AppError::Conflict("Loan has already been returned".to_string()));
            }

            let loan = sqlx::query_as::<_, Loan>(
                "UPDATE loans SET returned_at = $1, return_note = $2 WHERE id = $3 RETURNING *",
            )
            .bind(Utc::now())
            .bind(note)
            .bind(loan_id)
            .fetch_one(&mut *tx)
            .await?;

            let device = sqlx::query_as::<_, Device>(
                "UPDATE devices SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
            )
            .bind(DeviceStatus::Available)
            .bind(Utc::now())
            .bind(loan.device_id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok((loan, device))
        })
        .await
    }

    /// Dashboard aggregate: four status counts plus up to 50 open loans,
    /// read inside one transaction so the counts and the list describe the
    /// same moment.
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        tx_scope(async {
            let mut tx = self.pool.begin().await?;

            let mut counts = [0i64; 4];
            let statuses = [
                DeviceStatus::Available,
                DeviceStatus::OnLoan,
                DeviceStatus::Defect,
                DeviceStatus::Maintenance,
            ];
            for (slot, status) in counts.iter_mut().zip(statuses) {
                *slot = sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE status = $1")
                    .bind(status)
                    .fetch_one(&mut *tx)
                    .await?;
            }

            let open_loans = sqlx::query_as::<_, OpenLoan>(
                r#"
                SELECT l.id AS loan_id, l.device_id, d.call_sign, d.device_type,
                       l.borrower_name, l.borrowed_at
                FROM loans l
                JOIN devices d ON l.device_id = d.id
                WHERE l.returned_at IS NULL
                ORDER BY l.borrowed_at DESC
                LIMIT $1
                "#,
            )
            .bind(DASHBOARD_OPEN_LOANS)
            .fetch_all(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok(DashboardStats {
                available: counts[0],
                on_loan: counts[1],
                defect: counts[2],
                maintenance: counts[3],
                open_loans,
            })
        })
        .await
    }

    /// One page of loan history plus the total matching count.
    ///
    /// The data page and the count share one filter but run as independent
    /// reads; they are not guaranteed to be point-in-time consistent with
    /// each other.
    pub async fn history(&self, filter: &HistoryFilter) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let mut conditions = Vec::new();
        let mut idx = 1;

        if filter.device_id.is_some() {
            conditions.push(format!("l.device_id = ${}", idx));
            idx += 1;
        }
        if filter.from.is_some() {
            conditions.push(format!("l.borrowed_at >= ${}", idx));
            idx += 1;
        }
        if filter.to.is_some() {
            conditions.push(format!("l.borrowed_at <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM loans l {}", where_clause);

        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(id) = filter.device_id {
            count_builder = count_builder.bind(id);
        }
        if let Some(from) = filter.from {
            count_builder = count_builder.bind(from);
        }
        if let Some(to) = filter.to {
            count_builder = count_builder.bind(to);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let offset = (filter.page - 1) * filter.page_size;
        let select_query = format!(
            r#"
            SELECT l.id AS loan_id, l.borrower_name, l.borrowed_at, l.returned_at,
                   l.return_note, d.id AS device_id, d.call_sign, d.device_type,
                   d.status, d.serial_number
            FROM loans l
            JOIN devices d ON l.device_id = d.id
            {}
            ORDER BY l.borrowed_at DESC
            LIMIT {} OFFSET {}
            "#,
            where_clause, filter.page_size, offset
        );

        let mut select_builder = sqlx::query_as::<_, HistoryEntry>(&select_query);
        if let Some(id) = filter.device_id {
            select_builder = select_builder.bind(id);
        }
        if let Some(from) = filter.from {
            select_builder = select_builder.bind(from);
        }
        if let Some(to) = filter.to {
            select_builder = select_builder.bind(to);
        }
        let entries = select_builder.fetch_all(&self.pool).await?;

        Ok((entries, total))
    }

    /// Distinct borrower names matching the query, most recently seen
    /// first. Wildcards in the query are escaped so a literal `%` or `_`
    /// cannot widen the match.
    pub async fn suggestions(&self, query: &str, limit: i64) -> AppResult<Vec<BorrowerSuggestion>> {
        let pattern = format!("%{}%", escape_like(query));

        let suggestions = sqlx::query_as::<_, BorrowerSuggestion>(
            r#"
            SELECT borrower_name, MAX(borrowed_at) AS last_borrowed_at
            FROM loans
            WHERE borrower_name ILIKE $1 ESCAPE '\'
            GROUP BY borrower_name
            ORDER BY last_borrowed_at DESC
            LIMIT $2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escapes_percent_wildcard() {
        assert_eq!(escape_like("%"), "\\%");
        assert_eq!(escape_like("a%b"), "a\\%b");
    }

    #[test]
    fn escapes_underscore_wildcard() {
        assert_eq!(escape_like("_"), "\\_");
        assert_eq!(escape_like("Mai_r"), "Mai\\_r");
    }

    #[test]
    fn escapes_backslash_itself() {
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn leaves_plain_names_alone() {
        assert_eq!(escape_like("Schmidt"), "Schmidt");
    }
}
