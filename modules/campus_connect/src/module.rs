use std::sync::Arc;

use anyhow::Context;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::Router;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, ModuleEntry, RestfulModule, StatefulModule};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::rest::routes;
use crate::config::CampusConnectConfig;
use crate::contract::client::CampusConnectApi;
use crate::domain::identity::TokenService;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::CampusConnectLocalClient;
use crate::infra::security::Argon2Hasher;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::sea_orm_repo::{SeaOrmContentRepository, SeaOrmUserRepository};
use crate::MODULE_NAME;

/// Campus Connect module: content, interactions, event registration and
/// accounts, served over REST and through [`CampusConnectApi`].
pub struct CampusConnectModule {
    service: ArcSwapOption<Service>,
    config: ArcSwapOption<CampusConnectConfig>,
}

impl Default for CampusConnectModule {
    fn default() -> Self {
        Self {
            service: ArcSwapOption::empty(),
            config: ArcSwapOption::empty(),
        }
    }
}

impl CampusConnectModule {
    /// Registry entry with the db, rest and stateful capabilities.
    pub fn into_entry(self: Arc<Self>) -> ModuleEntry {
        ModuleEntry::new(MODULE_NAME, self.clone())
            .depends_on(&["api_ingress"])
            .with_db(self.clone())
            .with_rest(self.clone())
            .with_stateful(self)
    }

    /// In-process client; `None` until `init` has run.
    pub fn client(&self) -> Option<Arc<dyn CampusConnectApi>> {
        self.service
            .load_full()
            .map(|svc| Arc::new(CampusConnectLocalClient::new(svc)) as Arc<dyn CampusConnectApi>)
    }

    pub fn service(&self) -> Option<Arc<Service>> {
        self.service.load_full()
    }

    /// Wire the SQLite repositories, the Argon2 hasher and the token service.
    pub fn build_service(
        conn: DatabaseConnection,
        cfg: &CampusConnectConfig,
    ) -> anyhow::Result<Service> {
        let tokens = TokenService::new(&cfg.jwt_secret, cfg.token_ttl, cfg.issuer.clone())
            .context("campus_connect.jwt_secret")?;
        Ok(Service::new(
            Arc::new(SeaOrmContentRepository::new(conn.clone())),
            Arc::new(SeaOrmUserRepository::new(conn)),
            Arc::new(Argon2Hasher::default()),
            tokens,
            ServiceConfig {
                min_password_length: cfg.min_password_length,
                max_title_length: cfg.max_title_length,
                max_comment_length: cfg.max_comment_length,
            },
        ))
    }

    fn require_service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("{MODULE_NAME} is not initialized"))
    }
}

#[async_trait]
impl Module for CampusConnectModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: CampusConnectConfig = ctx.module_config_required()?;
        debug!(
            token_ttl = ?cfg.token_ttl,
            issuer = %cfg.issuer,
            bootstrap_admin = cfg.bootstrap_admin.is_some(),
            "campus_connect configured"
        );

        let db = ctx.db_required()?;
        let service = Self::build_service(db.sea(), &cfg)?;

        self.service.store(Some(Arc::new(service)));
        self.config.store(Some(Arc::new(cfg)));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for CampusConnectModule {
    async fn migrate(&self, db: &modkit_db::DbHandle) -> anyhow::Result<()> {
        info!("running campus_connect migrations");
        Migrator::up(db.seaorm(), None)
            .await
            .context("campus_connect migrations failed")?;
        Ok(())
    }
}

impl RestfulModule for CampusConnectModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        let service = self.require_service()?;
        let router = routes::register_routes(router, openapi, service)?;
        info!("campus_connect REST routes registered");
        Ok(router)
    }
}

#[async_trait]
impl StatefulModule for CampusConnectModule {
    async fn start(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let Some(admin) = self.config.load_full().and_then(|c| c.bootstrap_admin.clone()) else {
            return Ok(());
        };
        let service = self.require_service()?;
        let created = service
            .ensure_admin(&admin.name, &admin.email, &admin.password)
            .await
            .context("bootstrap admin")?;
        if !created {
            debug!(email = %admin.email, "bootstrap admin already present");
        }
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        Ok(())
    }
}
