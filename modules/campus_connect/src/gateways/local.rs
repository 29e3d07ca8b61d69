use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    client::CampusConnectApi,
    error::CampusError,
    model::{Caller, ContentDraft, ContentItem, ContentKind, User},
};
use crate::domain::service::Service;

/// Local implementation of [`CampusConnectApi`] that delegates to the domain service.
pub struct CampusConnectLocalClient {
    service: Arc<Service>,
}

impl CampusConnectLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl CampusConnectApi for CampusConnectLocalClient {
    async fn authenticate(&self, token: &str) -> Result<Caller, CampusError> {
        self.service.authenticate(token).map_err(Into::into)
    }

    async fn current_user(&self, caller: &Caller) -> Result<User, CampusError> {
        self.service.current_user(caller).await.map_err(Into::into)
    }

    async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, CampusError> {
        self.service.list_items(kind).await.map_err(Into::into)
    }

    async fn get_item(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem, CampusError> {
        self.service.get_item(kind, id).await.map_err(Into::into)
    }

    async fn create_item(
        &self,
        caller: &Caller,
        draft: ContentDraft,
    ) -> Result<ContentItem, CampusError> {
        self.service
            .create_item(caller, draft)
            .await
            .map_err(Into::into)
    }

    async fn toggle_like(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<ContentItem, CampusError> {
        self.service
            .toggle_like(caller, kind, id)
            .await
            .map_err(Into::into)
    }

    async fn add_comment(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
        text: &str,
    ) -> Result<ContentItem, CampusError> {
        self.service
            .add_comment(caller, kind, id, text)
            .await
            .map_err(Into::into)
    }

    async fn register_for_event(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, CampusError> {
        self.service
            .register_for_event(caller, event_id)
            .await
            .map_err(Into::into)
    }

    async fn cancel_registration(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, CampusError> {
        self.service
            .cancel_registration(caller, event_id)
            .await
            .map_err(Into::into)
    }
}
