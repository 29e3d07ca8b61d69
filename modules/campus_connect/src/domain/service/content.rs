use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{db_err, Service};
use crate::contract::model::{Caller, ContentDraft, ContentItem, ContentKind};
use crate::domain::error::DomainError;
use crate::domain::policy;
use crate::domain::repo::UpdateOutcome;

impl Service {
    #[instrument(name = "campus_connect.service.list_items", skip(self), fields(kind = %kind))]
    pub async fn list_items(&self, kind: ContentKind) -> Result<Vec<ContentItem>, DomainError> {
        let items = self.content.list(kind).await.map_err(db_err)?;
        debug!(count = items.len(), "listed content");
        Ok(items)
    }

    #[instrument(name = "campus_connect.service.get_item", skip(self), fields(kind = %kind, item_id = %id))]
    pub async fn get_item(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem, DomainError> {
        self.reload(kind, id).await
    }

    #[instrument(
        name = "campus_connect.service.create_item",
        skip(self, draft),
        fields(kind = %draft.kind(), user_id = %caller.user_id)
    )]
    pub async fn create_item(
        &self,
        caller: &Caller,
        draft: ContentDraft,
    ) -> Result<ContentItem, DomainError> {
        let kind = draft.kind();
        if !policy::can_create(caller.role, kind) {
            return Err(DomainError::forbidden(format!("create {kind}")));
        }
        let draft = self.validate_draft(draft)?;

        let id = Uuid::new_v4();
        self.content
            .insert(id, caller.user_id, &draft, Utc::now())
            .await
            .map_err(db_err)?;

        info!(item_id = %id, "content created");
        self.reload(kind, id).await
    }

    /// Full replacement of title, description and kind-specific fields.
    #[instrument(
        name = "campus_connect.service.update_item",
        skip(self, draft),
        fields(kind = %kind, item_id = %id, user_id = %caller.user_id)
    )]
    pub async fn update_item(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
        draft: ContentDraft,
    ) -> Result<ContentItem, DomainError> {
        self.authorize_modify(caller, kind, id).await?;
        if draft.kind() != kind {
            return Err(DomainError::validation(
                "kind",
                format!("expected {kind} fields, got {}", draft.kind()),
            ));
        }
        let draft = self.validate_draft(draft)?;

        match self
            .content
            .update(kind, id, &draft, Utc::now())
            .await
            .map_err(db_err)?
        {
            UpdateOutcome::Updated => {
                info!("content updated");
                self.reload(kind, id).await
            }
            UpdateOutcome::NotFound => Err(DomainError::content_not_found(kind, id)),
            UpdateOutcome::LimitBelowRegistrations { registered } => {
                Err(DomainError::validation(
                    "registration_limit",
                    format!("cannot be lower than the {registered} current registrations"),
                ))
            }
        }
    }

    /// Deletes the item together with its comments, likes and registrations.
    #[instrument(
        name = "campus_connect.service.delete_item",
        skip(self),
        fields(kind = %kind, item_id = %id, user_id = %caller.user_id)
    )]
    pub async fn delete_item(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<(), DomainError> {
        self.authorize_modify(caller, kind, id).await?;

        if !self.content.delete(kind, id).await.map_err(db_err)? {
            return Err(DomainError::content_not_found(kind, id));
        }
        info!("content deleted");
        Ok(())
    }

    /// The author id never changes, so checking it before the mutation is race-free.
    async fn authorize_modify(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let owner = self
            .content
            .owner_of(kind, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::content_not_found(kind, id))?;

        if !policy::can_modify(Some(caller), owner) {
            debug!(owner = %owner, "modification denied");
            return Err(DomainError::forbidden(format!("modify this {kind}")));
        }
        Ok(())
    }
}
