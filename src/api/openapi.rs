//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, devices, health, loans, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Radiopool API",
        version = "1.0.0",
        description = "Radio Fleet Loan Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::logout,
        auth::session_info,
        auth::change_credentials,
        auth::oidc_login,
        auth::oidc_callback,
        // Devices
        devices::list_devices,
        devices::get_device,
        devices::create_device,
        devices::update_device,
        devices::update_device_status,
        devices::delete_device,
        // Loans
        loans::borrow,
        loans::return_loan,
        loans::history,
        loans::suggestions,
        // Stats
        stats::get_dashboard,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::MessageResponse,
            auth::ChangeCredentialsRequest,
            auth::ChangeCredentialsResponse,
            crate::services::session::SessionInfo,
            // Devices
            crate::models::device::Device,
            crate::models::device::DeviceStatus,
            crate::models::device::CreateDevice,
            crate::models::device::UpdateDevice,
            crate::models::device::UpdateDeviceStatus,
            // Loans
            loans::BorrowRequest,
            loans::ReturnRequest,
            loans::LoanResponse,
            crate::models::loan::Loan,
            crate::models::loan::OpenLoan,
            crate::models::loan::HistoryEntry,
            crate::models::loan::HistoryPage,
            crate::models::loan::BorrowerSuggestion,
            crate::models::loan::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication and session management"),
        (name = "devices", description = "Device inventory management"),
        (name = "loans", description = "Loan desk, history and suggestions"),
        (name = "stats", description = "Dashboard statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
