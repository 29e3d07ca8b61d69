use axum::{
    body::Body,
    extract::Extension,
    http::{Request, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::get,
    Router,
};
use serde_json::json;
use tower::util::ServiceExt;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};

use api_ingress::request_id::{header as request_id_header, MakeReqId, XRequestId};

fn app() -> Router {
    let x_request_id = request_id_header();
    Router::new()
        .route("/echo", get(echo))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(from_fn(api_ingress::request_id::push_req_id_to_extensions))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}

async fn echo(Extension(XRequestId(id)): Extension<XRequestId>) -> Json<serde_json::Value> {
    Json(json!({ "request_id": id }))
}

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn missing_id_is_generated_and_visible_to_handlers() {
    let resp = app()
        .oneshot(Request::builder().uri("/echo").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let header = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .expect("x-request-id should be generated");
    assert!(!header.is_empty());

    let json = body_json(resp).await;
    assert_eq!(json["request_id"], header);
}

#[tokio::test]
async fn incoming_id_is_preserved() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/echo")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");
    assert_eq!(body_json(resp).await["request_id"], "abc-123");
}
