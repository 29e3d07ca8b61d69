use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use api_ingress::ApiIngress;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Path,
    http::{Request, StatusCode},
    Json, Router,
};
use modkit::api::{Missing, OperationBuilder};
use modkit::{
    ConfigProvider, Module, ModuleCtx, ModuleCtxBuilder, ModuleEntry, ModuleRegistry,
    OpenApiRegistry, RestfulModule, StatefulModule,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
struct Note {
    id: String,
    text: String,
}

struct NotesModule;

#[async_trait]
impl Module for NotesModule {
    async fn init(&self, _ctx: &ModuleCtx) -> Result<()> {
        Ok(())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

async fn get_note(Path(id): Path<String>) -> Json<Note> {
    Json(Note {
        id,
        text: "hello".into(),
    })
}

impl RestfulModule for NotesModule {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> Result<Router> {
        Ok(OperationBuilder::<Missing, Missing, ()>::get("/notes/{id}")
            .operation_id("notes.get")
            .tag("Notes")
            .path_param("id", "Note id")
            .bearer_auth()
            .handler(get_note)
            .json_response_with_schema::<Note>(openapi, 200, "Note")
            .problem_responses(openapi, &[401, 404])
            .register(router, openapi))
    }
}

struct Sections(HashMap<String, serde_json::Value>);

impl ConfigProvider for Sections {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.get(module_name)
    }
}

async fn wire(section: serde_json::Value) -> (Arc<ApiIngress>, Router) {
    let ingress = Arc::new(ApiIngress::default());
    let notes = Arc::new(NotesModule);
    let registry = ModuleRegistry::builder()
        .register(ingress.clone().into_entry())
        .register(
            ModuleEntry::new("notes", notes.clone())
                .depends_on(&["api_ingress"])
                .with_rest(notes),
        )
        .build()
        .unwrap();

    let mut map = HashMap::new();
    map.insert("api_ingress".to_string(), section);
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_config_provider(Arc::new(Sections(map)))
        .build();

    registry.run_init_phase(&ctx).await.unwrap();
    let router = registry.run_rest_phase(&ctx, Router::new()).unwrap();
    (ingress, router)
}

async fn get_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

#[tokio::test]
async fn health_and_module_routes_are_served() {
    let (ingress, router) = wire(serde_json::json!({})).await;
    assert!(ingress.router().is_some());

    let resp = router
        .clone()
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let (status, body) = get_json(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(&router, "/notes/n1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "n1");

    let (status, _) = get_json(&router, "/openapi.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND, "docs are off by default");
}

#[tokio::test]
async fn openapi_document_lists_registered_operations() {
    let (ingress, router) = wire(serde_json::json!({ "enable_docs": true })).await;
    assert_eq!(ingress.operation_count(), 1);

    let (status, doc) = get_json(&router, "/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    let op = &doc["paths"]["/notes/{id}"]["get"];
    assert_eq!(op["operationId"], "notes.get");
    assert_eq!(
        op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
        "#/components/schemas/Note"
    );
    assert!(op["responses"]["404"]["content"]
        .get("application/problem+json")
        .is_some());
    assert!(op["security"].is_array());
    assert!(doc["components"]["schemas"].get("Problem").is_some());
    assert_eq!(
        doc["components"]["securitySchemes"]["bearerAuth"]["type"],
        "http"
    );
}

#[tokio::test]
async fn server_binds_serves_and_drains_on_cancel() {
    let (ingress, _router) = wire(serde_json::json!({ "bind_addr": "127.0.0.1:0" })).await;
    let cancel = CancellationToken::new();
    ingress.start(cancel.clone()).await.unwrap();
    let addr = ingress.local_addr().expect("bound address");

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /healthz HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.ends_with("ok"));

    cancel.cancel();
    ingress.stop(cancel).await.unwrap();
}

#[tokio::test]
async fn invalid_bind_address_fails_start() {
    let (ingress, _router) = wire(serde_json::json!({ "bind_addr": "not-an-address" })).await;
    let err = ingress.start(CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("invalid bind address"));
}
