use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::CampusError,
    model::{Caller, ContentDraft, ContentItem, ContentKind, User},
};

/// In-process API of the campus_connect module.
#[async_trait]
pub trait CampusConnectApi: Send + Sync {
    /// Resolve a bearer credential.
    async fn authenticate(&self, token: &str) -> Result<Caller, CampusError>;

    async fn current_user(&self, caller: &Caller) -> Result<User, CampusError>;

    /// Newest first.
    async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, CampusError>;

    async fn get_item(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem, CampusError>;

    async fn create_item(
        &self,
        caller: &Caller,
        draft: ContentDraft,
    ) -> Result<ContentItem, CampusError>;

    async fn toggle_like(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<ContentItem, CampusError>;

    async fn add_comment(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
        text: &str,
    ) -> Result<ContentItem, CampusError>;

    async fn register_for_event(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, CampusError>;

    async fn cancel_registration(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, CampusError>;
}
