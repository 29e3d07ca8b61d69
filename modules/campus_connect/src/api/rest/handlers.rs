use std::sync::Arc;

use axum::{
    extract::Path,
    http::{StatusCode, Uri},
    response::Json,
    Extension,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::rest::auth::Authenticated;
use crate::api::rest::dto::{
    AnnouncementDto, AnnouncementReq, AuthResponse, CommentReq, DraftRequest, EventDto, EventReq,
    LoginReq, RegisterReq, ResourceDto, ResourceReq, UserDto,
};
use crate::api::rest::error::map_domain_error;
use crate::contract::model::{ContentItem, ContentKind};
use crate::domain::error::DomainError;
use crate::domain::service::Service;
use modkit::api::problem::ProblemResponse;

/// Binds a content kind to its wire representation so one set of
/// handlers serves announcements, events and resources.
pub trait ContentResource: Send + Sync + 'static {
    const KIND: ContentKind;
    /// Collection path, e.g. `/events`.
    const PATH: &'static str;
    const TAG: &'static str;
    type Dto: Serialize + From<ContentItem> + utoipa::ToSchema + Send + 'static;
    type Req: DeserializeOwned + DraftRequest + utoipa::ToSchema + Send + 'static;
}

pub struct Announcements;
pub struct Events;
pub struct Resources;

impl ContentResource for Announcements {
    const KIND: ContentKind = ContentKind::Announcement;
    const PATH: &'static str = "/announcements";
    const TAG: &'static str = "announcements";
    type Dto = AnnouncementDto;
    type Req = AnnouncementReq;
}

impl ContentResource for Events {
    const KIND: ContentKind = ContentKind::Event;
    const PATH: &'static str = "/events";
    const TAG: &'static str = "events";
    type Dto = EventDto;
    type Req = EventReq;
}

impl ContentResource for Resources {
    const KIND: ContentKind = ContentKind::Resource;
    const PATH: &'static str = "/resources";
    const TAG: &'static str = "resources";
    type Dto = ResourceDto;
    type Req = ResourceReq;
}

fn fail(e: DomainError, uri: &Uri) -> ProblemResponse {
    if !matches!(e, DomainError::Database { .. }) {
        debug!(error = %e, path = uri.path(), "request rejected");
    }
    map_domain_error(&e, uri.path())
}

// --- content ---

pub async fn list_items<R: ContentResource>(
    Extension(svc): Extension<Arc<Service>>,
    uri: Uri,
) -> Result<Json<Vec<R::Dto>>, ProblemResponse> {
    let items = svc.list_items(R::KIND).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(items.into_iter().map(R::Dto::from).collect()))
}

pub async fn get_item<R: ContentResource>(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<R::Dto>, ProblemResponse> {
    let item = svc.get_item(R::KIND, id).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(item.into()))
}

pub async fn create_item<R: ContentResource>(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Json(req): Json<R::Req>,
) -> Result<(StatusCode, Json<R::Dto>), ProblemResponse> {
    let item = svc
        .create_item(&caller, req.into_draft())
        .await
        .map_err(|e| fail(e, &uri))?;
    info!(kind = %R::KIND, item_id = %item.id, "created via REST");
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn update_item<R: ContentResource>(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
    Json(req): Json<R::Req>,
) -> Result<Json<R::Dto>, ProblemResponse> {
    let item = svc
        .update_item(&caller, R::KIND, id, req.into_draft())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(item.into()))
}

pub async fn delete_item<R: ContentResource>(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ProblemResponse> {
    svc.delete_item(&caller, R::KIND, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(StatusCode::NO_CONTENT)
}

// --- interactions ---

pub async fn add_comment<R: ContentResource>(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
    Json(req): Json<CommentReq>,
) -> Result<(StatusCode, Json<R::Dto>), ProblemResponse> {
    let item = svc
        .add_comment(&caller, R::KIND, id, &req.text)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn toggle_like<R: ContentResource>(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<R::Dto>, ProblemResponse> {
    let item = svc
        .toggle_like(&caller, R::KIND, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(item.into()))
}

// --- event registration ---

pub async fn register_for_event(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDto>, ProblemResponse> {
    let event = svc
        .register_for_event(&caller, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(event.into()))
}

pub async fn cancel_registration(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<Uuid>,
) -> Result<Json<EventDto>, ProblemResponse> {
    let event = svc
        .cancel_registration(&caller, id)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(event.into()))
}

// --- accounts ---

pub async fn register_account(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Json(req): Json<RegisterReq>,
) -> Result<(StatusCode, Json<AuthResponse>), ProblemResponse> {
    let session = svc
        .register_account(req.into())
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Json(req): Json<LoginReq>,
) -> Result<Json<AuthResponse>, ProblemResponse> {
    let session = svc
        .login(&req.email, &req.password)
        .await
        .map_err(|e| fail(e, &uri))?;
    Ok(Json(session.into()))
}

pub async fn me(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Authenticated(caller): Authenticated,
) -> Result<Json<UserDto>, ProblemResponse> {
    let user = svc.current_user(&caller).await.map_err(|e| fail(e, &uri))?;
    Ok(Json(user.into()))
}
