use std::sync::Arc;

use anyhow::Context;
use garden_db::SessionFactory;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::api::trigger::RegistrationTrigger;
use crate::config::GardenUsersConfig;
use crate::contract::client::GardenUsersApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::GardenUsersLocalClient;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::SeaOrmGardenRepository;

/// The garden_users module wired over a session factory.
///
/// Construction does no I/O; storage is first touched by [`GardenUsers::migrate`]
/// or by the first repository operation.
#[derive(Clone)]
pub struct GardenUsers {
    sessions: Arc<SessionFactory>,
    service: Arc<Service>,
    client: Arc<dyn GardenUsersApi>,
}

impl GardenUsers {
    pub fn new(sessions: Arc<SessionFactory>, cfg: &GardenUsersConfig) -> Self {
        info!("Initializing garden_users module");
        debug!(
            "Loaded garden_users config: max_name_length={}, default_list_limit={}, max_list_limit={}",
            cfg.max_name_length, cfg.default_list_limit, cfg.max_list_limit
        );

        let repo = SeaOrmGardenRepository::new(Arc::clone(&sessions));
        let service = Arc::new(Service::new(Arc::new(repo), ServiceConfig::from(cfg)));
        let client: Arc<dyn GardenUsersApi> =
            Arc::new(GardenUsersLocalClient::new(Arc::clone(&service)));

        Self {
            sessions,
            service,
            client,
        }
    }

    /// Create or upgrade the `users` and `profiles` tables.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        info!("Running garden_users database migrations");
        let handle = self
            .sessions
            .handle()
            .await
            .context("Database is not available for migrations")?;
        Migrator::up(handle.seaorm(), None)
            .await
            .context("garden_users migrations failed")?;
        info!("garden_users database migrations completed successfully");
        Ok(())
    }

    /// In-process client for other crates.
    pub fn client(&self) -> Arc<dyn GardenUsersApi> {
        Arc::clone(&self.client)
    }

    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    pub fn sessions(&self) -> Arc<SessionFactory> {
        Arc::clone(&self.sessions)
    }

    /// A fresh registration trigger bound to this module's client.
    pub fn registration_trigger(&self) -> RegistrationTrigger {
        RegistrationTrigger::new(self.client())
    }
}
