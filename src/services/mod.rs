//! Business logic services

pub mod auth;
pub mod devices;
pub mod ledger;
pub mod oidc;
pub mod session;

use crate::{
    config::{AuthConfig, OidcConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub devices: devices::DeviceService,
    pub ledger: ledger::LedgerService,
    /// Present only when an identity provider is configured
    pub oidc: Option<oidc::OidcService>,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        auth_config: AuthConfig,
        oidc_config: OidcConfig,
    ) -> AppResult<Self> {
        let oidc = if oidc_config.enabled {
            Some(oidc::OidcService::discover(oidc_config).await?)
        } else {
            None
        };

        Ok(Self {
            auth: auth::AuthService::new(repository.clone(), auth_config)?,
            devices: devices::DeviceService::new(repository.clone()),
            ledger: ledger::LedgerService::new(repository),
            oidc,
        })
    }
}
