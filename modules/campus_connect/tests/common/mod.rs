#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use campus_connect::contract::model::{Caller, NewAccount, Role};
use campus_connect::domain::identity::TokenService;
use campus_connect::domain::ports::CredentialHasher;
use campus_connect::domain::service::{Service, ServiceConfig};
use campus_connect::infra::storage::migrations::Migrator;
use campus_connect::infra::storage::sea_orm_repo::{
    SeaOrmContentRepository, SeaOrmUserRepository,
};
use modkit::api::{OpenApiRegistry, OperationSpec};
use modkit_db::{ConnectOpts, DbHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;

pub const SECRET: &str = "integration-test-secret";

/// Reversible stand-in for Argon2 so account-heavy tests stay fast.
pub struct PlainHasher;

#[async_trait]
impl CredentialHasher for PlainHasher {
    async fn hash(&self, password: &str) -> anyhow::Result<String> {
        Ok(format!("plain${password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

/// Records nothing; routes only need component names back.
pub struct MockOpenApiRegistry;

impl OpenApiRegistry for MockOpenApiRegistry {
    fn register_operation(&self, _spec: &OperationSpec) {}

    fn ensure_schema_raw(
        &self,
        name: &str,
        _schemas: Vec<(
            String,
            utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
        )>,
    ) -> String {
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub async fn migrated(dsn: &str) -> DbHandle {
    let db = DbHandle::connect(dsn, ConnectOpts::default())
        .await
        .expect("connect test database");
    Migrator::up(db.seaorm(), None)
        .await
        .expect("run migrations");
    db
}

pub fn service_on(conn: DatabaseConnection) -> Arc<Service> {
    let tokens = TokenService::new(SECRET, Duration::from_secs(3600), "campus-connect")
        .expect("token service");
    Arc::new(Service::new(
        Arc::new(SeaOrmContentRepository::new(conn.clone())),
        Arc::new(SeaOrmUserRepository::new(conn)),
        Arc::new(PlainHasher),
        tokens,
        ServiceConfig::default(),
    ))
}

pub async fn memory_service() -> Arc<Service> {
    let db = migrated("sqlite::memory:").await;
    service_on(db.sea())
}

pub fn router_for(service: Arc<Service>) -> Router {
    campus_connect::api::rest::routes::register_routes(
        Router::new(),
        &MockOpenApiRegistry,
        service,
    )
    .expect("register routes")
}

/// A signed-up caller and its bearer token.
pub struct Account {
    pub caller: Caller,
    pub token: String,
}

pub async fn sign_up(service: &Service, name: &str, role: Role) -> Account {
    let email = format!("{}@campus.edu", name.to_lowercase().replace(' ', "."));
    let session = match role {
        Role::Admin => {
            service
                .ensure_admin(name, &email, "admin-password")
                .await
                .expect("bootstrap admin");
            service
                .login(&email, "admin-password")
                .await
                .expect("admin login")
        }
        _ => service
            .register_account(NewAccount {
                name: name.to_string(),
                email,
                password: "password1".to_string(),
                role,
            })
            .await
            .expect("register account"),
    };
    Account {
        caller: Caller::new(session.user.id, session.user.role),
        token: session.token,
    }
}
