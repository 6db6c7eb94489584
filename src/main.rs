//! Radiopool Server - Radio Fleet Loan Management

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use radiopool_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("radiopool_server={},tower_http=debug", config.logging.level).into()
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Radiopool Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Server-side session store; the cookie only ever carries the token
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.session.secure_cookie)
        .with_http_only(true)
        .with_same_site(SameSite::Strict)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session.timeout_hours,
        )));

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.auth.clone(), config.oidc.clone())
        .await
        .expect("Failed to create services");

    services
        .auth
        .ensure_bootstrap_admin()
        .await
        .expect("Failed to ensure bootstrap admin account");

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = create_router(state).layer(session_layer);

    // Start server
    let addr = SocketAddr::new(
        server_host.parse().expect("Invalid host address"),
        server_port,
    );

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes, gated by the session middleware except for the
    // explicit public allow-list
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/logout", post(api::auth::logout))
        .route("/auth/session", get(api::auth::session_info))
        .route("/auth/credentials", put(api::auth::change_credentials))
        .route("/auth/oidc/login", get(api::auth::oidc_login))
        .route("/auth/oidc/callback", get(api::auth::oidc_callback))
        // Devices
        .route("/devices", get(api::devices::list_devices))
        .route("/devices", post(api::devices::create_device))
        .route("/devices/:id", get(api::devices::get_device))
        .route("/devices/:id", put(api::devices::update_device))
        .route("/devices/:id", delete(api::devices::delete_device))
        .route("/devices/:id/status", put(api::devices::update_device_status))
        // Loan desk
        .route("/loans", post(api::loans::borrow))
        .route("/loans/:id/return", post(api::loans::return_loan))
        .route("/loans/history", get(api::loans::history))
        .route("/loans/suggestions", get(api::loans::suggestions))
        // Statistics
        .route("/stats/dashboard", get(api::stats::get_dashboard))
        .layer(middleware::from_fn(api::session_gate))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
