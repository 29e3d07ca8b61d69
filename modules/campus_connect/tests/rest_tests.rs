//! HTTP surface: status codes, problem bodies and response shapes.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use campus_connect::contract::model::Role;
use common::{memory_service, router_for, sign_up};

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn event_body(limit: i64) -> Value {
    json!({
        "title": "Hackathon",
        "description": "24 hours of code",
        "date": (chrono::Utc::now() + chrono::Duration::days(10)).to_rfc3339(),
        "location": "Engineering Building",
        "registration_limit": limit,
    })
}

#[tokio::test]
async fn lists_are_public() {
    let app = router_for(memory_service().await);
    for path in ["/announcements", "/events", "/resources"] {
        let (status, body) = call(&app, Method::GET, path, None, None).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body, json!([]));
    }
}

#[tokio::test]
async fn mutations_without_a_token_are_unauthenticated() {
    let app = router_for(memory_service().await);
    let (status, body) = call(
        &app,
        Method::POST,
        "/announcements",
        None,
        Some(json!({"title": "t", "description": "d"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "CAMPUS_UNAUTHENTICATED");
    assert_eq!(body["status"], 401);

    let (status, _) = call(
        &app,
        Method::POST,
        "/events",
        Some("garbage.token.value"),
        Some(event_body(0)),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_are_forbidden_from_posting_events_but_faculty_are_not() {
    let svc = memory_service().await;
    let student = sign_up(&svc, "Stu", Role::Student).await;
    let faculty = sign_up(&svc, "Fac", Role::Faculty).await;
    let app = router_for(svc);

    let (status, body) = call(
        &app,
        Method::POST,
        "/events",
        Some(&student.token),
        Some(event_body(50)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CAMPUS_FORBIDDEN");
    assert_eq!(body["instance"], "/events");

    let (status, body) = call(
        &app,
        Method::POST,
        "/events",
        Some(&faculty.token),
        Some(event_body(50)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["registration_limit"], 50);
    assert_eq!(body["registered_count"], 0);
    assert_eq!(body["created_by"]["name"], "Fac");
    assert_eq!(body["created_by"]["role"], "faculty");
}

#[tokio::test]
async fn role_and_ownership_are_checked_before_the_body() {
    let svc = memory_service().await;
    let student = sign_up(&svc, "Stu", Role::Student).await;
    let faculty = sign_up(&svc, "Fac", Role::Faculty).await;
    let app = router_for(svc);

    let (status, body) = call(
        &app,
        Method::POST,
        "/events",
        Some(&student.token),
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CAMPUS_FORBIDDEN");

    let (_, event) = call(&app, Method::POST, "/events", Some(&faculty.token), Some(event_body(5))).await;
    let id = event["id"].as_str().unwrap().to_owned();

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/events/{id}"),
        Some(&student.token),
        Some(json!({"registration_limit": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "CAMPUS_FORBIDDEN");

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/events/{id}"),
        Some(&faculty.token),
        Some(json!({"title": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["pointer"], "/description");
}

#[tokio::test]
async fn validation_errors_point_at_the_field() {
    let svc = memory_service().await;
    let student = sign_up(&svc, "Stu", Role::Student).await;
    let app = router_for(svc);

    let (status, body) = call(
        &app,
        Method::POST,
        "/resources",
        Some(&student.token),
        Some(json!({"title": "Slides", "description": "Week 2", "category": "slides"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CAMPUS_VALIDATION");
    assert_eq!(body["errors"][0]["pointer"], "/file_url");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let svc = memory_service().await;
    let student = sign_up(&svc, "Stu", Role::Student).await;
    let app = router_for(svc);
    let missing = uuid::Uuid::new_v4();

    let (status, body) = call(&app, Method::GET, &format!("/events/{missing}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "CAMPUS_NOT_FOUND");

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/resources/{missing}/like"),
        Some(&student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn resource_like_comment_and_delete_round() {
    let svc = memory_service().await;
    let owner = sign_up(&svc, "Owner", Role::Student).await;
    let fan = sign_up(&svc, "Fan", Role::Student).await;
    let app = router_for(svc);

    let (status, created) = call(
        &app,
        Method::POST,
        "/resources",
        Some(&owner.token),
        Some(json!({
            "title": "Past papers",
            "description": "2019-2024",
            "file_url": "files.campus.edu/papers.zip",
            "category": "exams",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["file_url"], "https://files.campus.edu/papers.zip");
    assert_eq!(created["uploaded_by"]["name"], "Owner");
    let path = format!("/resources/{}", created["id"].as_str().unwrap());

    let (status, liked) = call(&app, Method::POST, &format!("{path}/like"), Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(liked["like_count"], 1);

    let (status, commented) = call(
        &app,
        Method::POST,
        &format!("{path}/comments"),
        Some(&fan.token),
        Some(json!({"text": "Lifesaver"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(commented["comments"][0]["text"], "Lifesaver");
    assert_eq!(commented["comments"][0]["created_by"]["name"], "Fan");

    let (status, _) = call(&app, Method::DELETE, &path, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::DELETE, &path, Some(&owner.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = call(&app, Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn events_have_no_like_route() {
    let svc = memory_service().await;
    let faculty = sign_up(&svc, "Fac", Role::Faculty).await;
    let app = router_for(svc);

    let (_, created) = call(&app, Method::POST, "/events", Some(&faculty.token), Some(event_body(0))).await;
    let id = created["id"].as_str().unwrap();
    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/events/{id}/like"),
        Some(&faculty.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_event_answers_conflict() {
    let svc = memory_service().await;
    let faculty = sign_up(&svc, "Fac", Role::Faculty).await;
    let a = sign_up(&svc, "Ann", Role::Student).await;
    let b = sign_up(&svc, "Ben", Role::Student).await;
    let app = router_for(svc);

    let (_, created) = call(&app, Method::POST, "/events", Some(&faculty.token), Some(event_body(1))).await;
    let id = created["id"].as_str().unwrap();

    let (status, event) = call(&app, Method::POST, &format!("/events/{id}/register"), Some(&a.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(event["registered_count"], 1);
    assert_eq!(event["registered_users"][0]["name"], "Ann");

    let (status, body) = call(&app, Method::POST, &format!("/events/{id}/register"), Some(&b.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAMPUS_EVENT_FULL");

    let (status, body) = call(&app, Method::POST, &format!("/events/{id}/cancel"), Some(&b.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAMPUS_NOT_REGISTERED");
}

#[tokio::test]
async fn negative_limit_is_rejected() {
    let svc = memory_service().await;
    let faculty = sign_up(&svc, "Fac", Role::Faculty).await;
    let app = router_for(svc);

    let (status, body) = call(&app, Method::POST, "/events", Some(&faculty.token), Some(event_body(-1))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["pointer"], "/registration_limit");
}

#[tokio::test]
async fn auth_routes_issue_and_accept_tokens() {
    let app = router_for(memory_service().await);

    let (status, registered) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Nia",
            "email": "nia@campus.edu",
            "password": "secret-pass",
            "role": "student",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["user"]["role"], "student");

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Nia again",
            "email": "NIA@campus.edu",
            "password": "secret-pass",
            "role": "faculty",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CAMPUS_EMAIL_TAKEN");

    let (status, body) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "nia@campus.edu", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "CAMPUS_INVALID_LOGIN");

    let (status, session) = call(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"email": "nia@campus.edu", "password": "secret-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = session["token"].as_str().unwrap();

    let (status, me) = call(&app, Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "nia@campus.edu");
    assert_eq!(me["id"], registered["user"]["id"]);
}
