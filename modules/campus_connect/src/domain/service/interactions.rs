use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{db_err, Service};
use crate::contract::model::{Caller, ContentItem, ContentKind};
use crate::domain::error::DomainError;
use crate::domain::repo::NewComment;

impl Service {
    /// Flips the caller's membership in the like set. Any authenticated user.
    #[instrument(
        name = "campus_connect.service.toggle_like",
        skip(self),
        fields(kind = %kind, item_id = %id, user_id = %caller.user_id)
    )]
    pub async fn toggle_like(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
    ) -> Result<ContentItem, DomainError> {
        let liked = self
            .content
            .toggle_like(kind, id, caller.user_id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::content_not_found(kind, id))?;
        debug!(liked, "like toggled");
        self.reload(kind, id).await
    }

    /// Appends to the end of the thread. Any authenticated user.
    #[instrument(
        name = "campus_connect.service.add_comment",
        skip(self, text),
        fields(kind = %kind, item_id = %id, user_id = %caller.user_id)
    )]
    pub async fn add_comment(
        &self,
        caller: &Caller,
        kind: ContentKind,
        id: Uuid,
        text: &str,
    ) -> Result<ContentItem, DomainError> {
        let text = self.validate_comment(text)?;
        let comment = NewComment {
            id: Uuid::new_v4(),
            author: caller.user_id,
            text,
            created_at: Utc::now(),
        };
        let comment_id = comment.id;

        if !self
            .content
            .append_comment(kind, id, comment)
            .await
            .map_err(db_err)?
        {
            return Err(DomainError::content_not_found(kind, id));
        }
        debug!(comment_id = %comment_id, "comment added");
        self.reload(kind, id).await
    }
}
