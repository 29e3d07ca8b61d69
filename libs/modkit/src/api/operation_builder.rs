//! Type-state builder for REST operations.
//!
//! `register()` only exists once a handler and at least one response are
//! declared, so a route cannot reach the router without its OpenAPI entry.
//!
//! ```rust,ignore
//! router = OperationBuilder::<Missing, Missing, ()>::get("/events/{id}")
//!     .operation_id("events.get")
//!     .path_param("id", "Event id")
//!     .bearer_auth()
//!     .handler(get_event)
//!     .json_response_with_schema::<EventDto>(openapi, 200, "Event")
//!     .problem_responses(openapi, &[401, 404])
//!     .register(router, openapi);
//! ```

use axum::{handler::Handler, routing::MethodRouter, Router};
use http::Method;
use std::marker::PhantomData;

use crate::api::problem::{Problem, APPLICATION_PROBLEM_JSON};

type SchemaCollection = Vec<(
    String,
    utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
)>;

pub mod state {
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

pub use state::{Missing, Present};

mod sealed {
    pub trait Sealed {}
}

/// Maps the handler state to what the builder stores: nothing, or the route.
pub trait HandlerSlot<S>: sealed::Sealed {
    type Slot;
}

impl sealed::Sealed for Missing {}
impl sealed::Sealed for Present {}

impl<S> HandlerSlot<S> for Missing {
    type Slot = ();
}

impl<S> HandlerSlot<S> for Present {
    type Slot = MethodRouter<S>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamLocation {
    Path,
    Query,
}

#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub description: Option<String>,
    /// JSON Schema type name (`string`, `integer`, ...).
    pub param_type: String,
}

#[derive(Clone, Debug)]
pub struct RequestBodySpec {
    pub content_type: &'static str,
    pub description: Option<String>,
    /// Component name referenced through `$ref`.
    pub schema_name: Option<String>,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct ResponseSpec {
    pub status: u16,
    /// `None` for bodiless responses such as 204.
    pub content_type: Option<&'static str>,
    pub description: String,
    pub schema_name: Option<String>,
    /// The body is an array of `schema_name`.
    pub array: bool,
}

#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub params: Vec<ParamSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<ResponseSpec>,
    /// Operation expects `Authorization: Bearer <token>`.
    pub requires_auth: bool,
}

/// Sink for operation specs and component schemas; implemented by the REST host.
pub trait OpenApiRegistry {
    fn register_operation(&self, spec: &OperationSpec);

    /// Store `schemas` (the root plus everything it references) and return the
    /// component name to use in `$ref`.
    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String;

    fn as_any(&self) -> &dyn std::any::Any;
}

/// Register `T` and its transitive schemas; returns the component name.
pub fn ensure_schema<T: utoipa::ToSchema + 'static>(registry: &dyn OpenApiRegistry) -> String {
    use utoipa::PartialSchema;

    let root = T::name().to_string();
    // Root first, as a concrete schema rather than a self-reference.
    let mut collected: SchemaCollection = vec![(root.clone(), <T as PartialSchema>::schema())];
    T::schemas(&mut collected);
    registry.ensure_schema_raw(&root, collected)
}

/// `H`: handler state, `R`: response state, `S`: router state.
pub struct OperationBuilder<H, R, S>
where
    H: HandlerSlot<S>,
{
    spec: OperationSpec,
    method_router: <H as HandlerSlot<S>>::Slot,
    _marker: PhantomData<(H, R, fn() -> S)>,
}

impl<S> OperationBuilder<Missing, Missing, S> {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            spec: OperationSpec {
                method,
                path: path.into(),
                operation_id: None,
                summary: None,
                description: None,
                tags: Vec::new(),
                params: Vec::new(),
                request_body: None,
                responses: Vec::new(),
                requires_auth: false,
            },
            method_router: (),
            _marker: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }
}

impl<H, R, S> OperationBuilder<H, R, S>
where
    H: HandlerSlot<S>,
{
    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.spec.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.spec.summary = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.spec.description = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.spec.tags.push(tag.into());
        self
    }

    pub fn path_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.into(),
            location: ParamLocation::Path,
            required: true,
            description: Some(description.into()),
            param_type: "string".to_string(),
        });
        self
    }

    pub fn query_param(
        mut self,
        name: impl Into<String>,
        required: bool,
        description: impl Into<String>,
    ) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.into(),
            location: ParamLocation::Query,
            required,
            description: Some(description.into()),
            param_type: "string".to_string(),
        });
        self
    }

    /// Required JSON body; registers `T` as a component schema.
    pub fn json_request<T>(mut self, registry: &dyn OpenApiRegistry, desc: impl Into<String>) -> Self
    where
        T: utoipa::ToSchema + 'static,
    {
        self.spec.request_body = Some(RequestBodySpec {
            content_type: "application/json",
            description: Some(desc.into()),
            schema_name: Some(ensure_schema::<T>(registry)),
            required: true,
        });
        self
    }

    /// Mark the operation as requiring a bearer token.
    pub fn bearer_auth(mut self) -> Self {
        self.spec.requires_auth = true;
        self
    }

    fn with_response(mut self, resp: ResponseSpec) -> OperationBuilder<H, Present, S> {
        self.spec.responses.push(resp);
        OperationBuilder {
            spec: self.spec,
            method_router: self.method_router,
            _marker: PhantomData,
        }
    }

    pub fn json_response_with_schema<T>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S>
    where
        T: utoipa::ToSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.with_response(ResponseSpec {
            status,
            content_type: Some("application/json"),
            description: description.into(),
            schema_name: Some(name),
            array: false,
        })
    }

    /// JSON array of `T`.
    pub fn json_list_response<T>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S>
    where
        T: utoipa::ToSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.with_response(ResponseSpec {
            status,
            content_type: Some("application/json"),
            description: description.into(),
            schema_name: Some(name),
            array: true,
        })
    }

    /// Bodiless response (e.g. 204 No Content).
    pub fn empty_response(
        self,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        self.with_response(ResponseSpec {
            status,
            content_type: None,
            description: description.into(),
            schema_name: None,
            array: false,
        })
    }

    /// RFC 9457 `application/problem+json` responses, one per status, described
    /// by the status's canonical reason phrase.
    pub fn problem_responses(
        self,
        registry: &dyn OpenApiRegistry,
        statuses: &[u16],
    ) -> OperationBuilder<H, Present, S> {
        let name = ensure_schema::<Problem>(registry);
        let mut out = OperationBuilder {
            spec: self.spec,
            method_router: self.method_router,
            _marker: PhantomData,
        };
        for &status in statuses {
            let reason = http::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Error");
            out.spec.responses.push(ResponseSpec {
                status,
                content_type: Some(APPLICATION_PROBLEM_JSON),
                description: reason.to_string(),
                schema_name: Some(name.clone()),
                array: false,
            });
        }
        out
    }
}

impl<R, S> OperationBuilder<Missing, R, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn handler<F, T>(self, h: F) -> OperationBuilder<Present, R, S>
    where
        F: Handler<T, S> + Clone + Send + 'static,
        T: 'static,
    {
        let method_router = match self.spec.method {
            Method::POST => axum::routing::post(h),
            Method::PUT => axum::routing::put(h),
            Method::DELETE => axum::routing::delete(h),
            Method::PATCH => axum::routing::patch(h),
            _ => axum::routing::get(h),
        };
        OperationBuilder {
            spec: self.spec,
            method_router,
            _marker: PhantomData,
        }
    }
}

impl<S> OperationBuilder<Present, Present, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Publish the spec and mount the route.
    pub fn register(self, router: Router<S>, openapi: &dyn OpenApiRegistry) -> Router<S> {
        openapi.register_operation(&self.spec);
        router.route(&self.spec.path, self.method_router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRegistry {
        operations: Mutex<Vec<OperationSpec>>,
        schemas: Mutex<Vec<String>>,
    }

    impl OpenApiRegistry for RecordingRegistry {
        fn register_operation(&self, spec: &OperationSpec) {
            self.operations.lock().unwrap().push(spec.clone());
        }

        fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String {
            let mut seen = self.schemas.lock().unwrap();
            for (n, _) in schemas {
                if !seen.contains(&n) {
                    seen.push(n);
                }
            }
            name.to_string()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[derive(serde::Serialize, utoipa::ToSchema)]
    struct Item {
        id: String,
    }

    async fn ok() -> Json<serde_json::Value> {
        Json(serde_json::json!({ "status": "ok" }))
    }

    #[test]
    fn descriptive_methods_fill_the_spec() {
        let b = OperationBuilder::<Missing, Missing, ()>::get("/items/{id}")
            .operation_id("items.get")
            .summary("Get item")
            .description("Fetch one item")
            .tag("items")
            .path_param("id", "Item id")
            .query_param("verbose", false, "More output")
            .bearer_auth();

        let spec = b.spec();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.operation_id.as_deref(), Some("items.get"));
        assert_eq!(spec.tags, ["items"]);
        assert_eq!(spec.params.len(), 2);
        assert_eq!(spec.params[0].location, ParamLocation::Path);
        assert!(spec.params[0].required);
        assert!(!spec.params[1].required);
        assert!(spec.requires_auth);
    }

    #[tokio::test]
    async fn register_publishes_spec_and_schemas() {
        let registry = RecordingRegistry::default();
        let _router: Router = OperationBuilder::post("/items")
            .json_request::<Item>(&registry, "New item")
            .handler(ok)
            .json_response_with_schema::<Item>(&registry, 201, "Created")
            .problem_responses(&registry, &[400, 401])
            .register(Router::new(), &registry);

        let ops = registry.operations.lock().unwrap();
        assert_eq!(ops.len(), 1);
        let op = &ops[0];
        assert_eq!(op.method, Method::POST);
        assert!(op.request_body.as_ref().unwrap().required);
        let statuses: Vec<u16> = op.responses.iter().map(|r| r.status).collect();
        assert_eq!(statuses, [201, 400, 401]);
        assert_eq!(op.responses[2].description, "Unauthorized");
        assert_eq!(op.responses[1].content_type, Some(APPLICATION_PROBLEM_JSON));

        let schemas = registry.schemas.lock().unwrap();
        assert!(schemas.iter().any(|s| s == "Item"));
        assert!(schemas.iter().any(|s| s == "Problem"));
    }

    #[test]
    fn list_and_empty_responses_are_shaped() {
        let registry = RecordingRegistry::default();
        let b = OperationBuilder::<Missing, Missing, ()>::delete("/items/{id}")
            .handler(ok)
            .empty_response(204, "Deleted")
            .json_list_response::<Item>(&registry, 200, "Items");

        let responses = &b.spec().responses;
        assert_eq!(responses[0].content_type, None);
        assert!(responses[1].array);
        assert_eq!(responses[1].schema_name.as_deref(), Some("Item"));
    }
}
