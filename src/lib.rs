//! Radiopool - Radio Fleet Loan Management
//!
//! A session-gated REST JSON API for tracking a fleet of loanable radio
//! devices: inventory lifecycle, loan desk, dashboard aggregates and loan
//! history.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
