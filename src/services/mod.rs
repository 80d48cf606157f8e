//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loader;
pub mod purge;
pub mod reservations;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub reservations: reservations::ReservationsService,
    pub loader: loader::LoaderService,
    pub purge: purge::PurgeService,
    repository: Repository,
}

impl Services {
    /// Create all services over the given store
    pub fn new(repository: Repository, auth_config: AuthConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            reservations: reservations::ReservationsService::new(repository.clone()),
            loader: loader::LoaderService::new(repository.clone()),
            purge: purge::PurgeService::new(repository.clone()),
            repository,
        }
    }

    /// Check that the store answers
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
