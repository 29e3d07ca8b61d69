//! HTTP ingress: hosts the single axum router, collects every module's
//! operation specs into one OpenAPI document, and serves the router.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::http::{header, Method};
use axum::response::IntoResponse;
use axum::{middleware::from_fn, routing::get, Router};
use dashmap::DashMap;
use modkit::api::{OpenApiRegistry, OperationSpec};
use modkit::{ModuleCtx, ModuleEntry};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub const MODULE_NAME: &str = "api_ingress";

pub struct ApiIngress {
    config: ArcSwap<ApiIngressConfig>,
    components: ArcSwap<openapi::Components>,
    operation_specs: DashMap<(Method, String), OperationSpec>,
    /// Router produced by the REST phase, served by `start`.
    final_router: Mutex<Option<Router>>,
    server: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            components: ArcSwap::from_pointee(openapi::Components::new()),
            operation_specs: DashMap::new(),
            final_router: Mutex::new(None),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    /// Registry entry exposing every capability of the ingress.
    pub fn into_entry(self: Arc<Self>) -> ModuleEntry {
        ModuleEntry::new(MODULE_NAME, self.clone())
            .with_rest_host(self.clone())
            .with_stateful(self)
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    /// Clone of the finalized router (available after the REST phase).
    pub fn router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    /// Address the server is listening on, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub fn operation_count(&self) -> usize {
        self.operation_specs.len()
    }

    /// Global middleware, outermost first:
    /// SetRequestId → trace → request id to extensions → PropagateRequestId →
    /// timeout → CORS (optional) → body limit.
    fn apply_middleware(&self, mut router: Router) -> Router {
        let cfg = self.get_config();
        let x_request_id = request_id::header();

        router = router.layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        if cfg.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }
        router
            .layer(TimeoutLayer::new(cfg.request_timeout))
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
    }

    pub fn build_openapi(&self) -> Result<serde_json::Value> {
        let components = self.components.load();
        let specs: Vec<OperationSpec> = self
            .operation_specs
            .iter()
            .map(|e| e.value().clone())
            .collect();
        tracing::info!(operations = specs.len(), "building OpenAPI document");
        openapi::build_document(
            &openapi::DocInfo {
                title: "Campus Connect API",
                version: env!("CARGO_PKG_VERSION"),
                description: "Announcements, events and resources shared across campus",
            },
            specs.iter(),
            &components,
        )
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg = ctx.module_config::<ApiIngressConfig>();
        tracing::debug!(bind_addr = %cfg.bind_addr, docs = cfg.enable_docs, "api_ingress configured");
        self.config.store(Arc::new(cfg));
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &ModuleCtx, router: Router) -> Result<Router> {
        Ok(router
            .route("/health", get(web::health_check))
            .route("/healthz", get(web::healthz)))
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, mut router: Router) -> Result<Router> {
        if self.get_config().enable_docs {
            let doc = Arc::new(self.build_openapi()?);
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move {
                            (
                                [(header::CACHE_CONTROL, "no-store")],
                                axum::Json((*doc).clone()),
                            )
                                .into_response()
                        }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        let router = self.apply_middleware(router);
        *self.final_router.lock() = Some(router.clone());
        tracing::debug!(operations = self.operation_count(), "router finalized");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

#[async_trait]
impl modkit::contracts::StatefulModule for ApiIngress {
    /// Bind the listener (bind errors fail startup) and serve in the background.
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.get_config();
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address '{}'", cfg.bind_addr))?;
        let router = self
            .router()
            .unwrap_or_else(|| self.apply_middleware(Router::new()));

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("cannot bind {addr}"))?;
        let bound = listener.local_addr()?;
        *self.local_addr.lock() = Some(bound);
        tracing::info!(addr = %bound, "HTTP server listening");

        let handle = tokio::spawn(async move {
            let shutdown = async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server draining connections");
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "HTTP server terminated with error");
            }
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        let Some(handle) = self.server.lock().take() else {
            return Ok(());
        };
        let timeout = self.get_config().shutdown_timeout;
        match tokio::time::timeout(timeout, handle).await {
            Ok(joined) => joined.context("HTTP server task panicked")?,
            Err(_) => tracing::warn!(?timeout, "HTTP server did not drain in time"),
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

impl OpenApiRegistry for ApiIngress {
    /// First registration of a `(method, path)` wins.
    fn register_operation(&self, spec: &OperationSpec) {
        let key = (spec.method.clone(), spec.path.clone());
        if self.operation_specs.contains_key(&key) {
            tracing::error!(
                method = %spec.method,
                path = %spec.path,
                "duplicate operation; keeping the first registration"
            );
            return;
        }
        self.operation_specs.insert(key, spec.clone());
        tracing::debug!(method = %spec.method, path = %spec.path, "registered operation");
    }

    fn ensure_schema_raw(
        &self,
        root_name: &str,
        schemas: Vec<(String, utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>)>,
    ) -> String {
        self.components.rcu(|current| {
            let mut next = (**current).clone();
            for (name, schema) in &schemas {
                next.entry(name.clone()).or_insert_with(|| schema.clone());
            }
            next
        });
        root_name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
