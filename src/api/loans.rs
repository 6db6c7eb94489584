//! Loan desk, history and suggestion endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        device::DeviceStatus,
        loan::{BorrowerSuggestion, HistoryPage, Loan},
    },
    services::ledger::HistoryParams,
};

use super::CurrentAdmin;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub device_id: Uuid,
    pub borrower_name: String,
}

/// Return request
#[derive(Deserialize, Default, ToSchema)]
pub struct ReturnRequest {
    pub note: Option<String>,
}

/// Loan desk response: the loan plus the device status it left behind
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub loan: Loan,
    pub device_status: DeviceStatus,
    pub message: String,
}

/// Query parameters for loan history
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Restrict to one device
    pub device_id: Option<String>,
    /// Earliest borrow time (RFC 3339)
    pub from: Option<String>,
    /// Latest borrow time (RFC 3339)
    pub to: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Query parameters for borrower suggestions
#[derive(Debug, Deserialize, IntoParams)]
pub struct SuggestionQuery {
    /// Name fragment to match
    pub q: String,
    pub limit: Option<i64>,
}

/// Borrow a device
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanResponse),
        (status = 400, description = "Blank borrower name"),
        (status = 404, description = "Device not found"),
        (status = 409, description = "Device not available")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Json(req): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let (loan, device) = state
        .services
        .ledger
        .borrow(req.device_id, &req.borrower_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            loan,
            device_status: device.status,
            message: format!("Device {} borrowed", device.call_sign),
        }),
    ))
}

/// Return a borrowed device
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    params(("id" = Uuid, Path, description = "Loan ID")),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Device returned", body = LoanResponse),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Path(loan_id): Path<Uuid>,
    Json(req): Json<ReturnRequest>,
) -> AppResult<Json<LoanResponse>> {
    let (loan, device) = state
        .services
        .ledger
        .return_loan(loan_id, req.note.as_deref())
        .await?;

    Ok(Json(LoanResponse {
        loan,
        device_status: device.status,
        message: format!("Device {} returned", device.call_sign),
    }))
}

/// Paginated, filterable loan history
#[utoipa::path(
    get,
    path = "/loans/history",
    tag = "loans",
    params(HistoryQuery),
    responses(
        (status = 200, description = "One page of loan history", body = HistoryPage),
        (status = 400, description = "Malformed filter or page bounds")
    )
)]
pub async fn history(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryPage>> {
    let page = state
        .services
        .ledger
        .history(&HistoryParams {
            device_id: query.device_id,
            from: query.from,
            to: query.to,
            page: query.page,
            page_size: query.page_size,
        })
        .await?;
    Ok(Json(page))
}

/// Borrower name suggestions for input assistance
#[utoipa::path(
    get,
    path = "/loans/suggestions",
    tag = "loans",
    params(SuggestionQuery),
    responses(
        (status = 200, description = "Matching borrower names", body = Vec<BorrowerSuggestion>)
    )
)]
pub async fn suggestions(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
    Query(query): Query<SuggestionQuery>,
) -> AppResult<Json<Vec<BorrowerSuggestion>>> {
    let suggestions = state
        .services
        .ledger
        .suggestions(&query.q, query.limit)
        .await?;
    Ok(Json(suggestions))
}
