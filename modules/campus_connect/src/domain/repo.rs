use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{ContentDraft, ContentItem, ContentKind, User};

/// Comment ready to be appended; the service assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub id: Uuid,
    pub author: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    /// The new positive limit is below the number of current registrations.
    LimitBelowRegistrations { registered: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    NotFound,
    Closed,
    AlreadyRegistered,
    Full { limit: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    NotRegistered,
}

/// Persistence port for content items and their interactions.
///
/// Every mutating method is atomic per item: it either applies completely
/// or leaves no trace, and concurrent calls on the same item serialize.
/// Mutations report only their outcome; a later [`find`](Self::find) runs in
/// its own transaction and may already include changes committed after the
/// caller's mutation.
///
/// Drafts passed to `insert` and `update` have been validated, so an event
/// draft always carries a date and a non-negative limit.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn insert(
        &self,
        id: Uuid,
        author: Uuid,
        draft: &ContentDraft,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()>;

    /// Fully populated item (comments, likes, registrations, author refs).
    async fn find(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<ContentItem>>;

    /// Newest first; ties broken by id, descending.
    async fn list(&self, kind: ContentKind) -> anyhow::Result<Vec<ContentItem>>;

    async fn owner_of(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<Uuid>>;

    /// Full replacement of the writable fields. `draft.kind()` must equal `kind`.
    async fn update(
        &self,
        kind: ContentKind,
        id: Uuid,
        draft: &ContentDraft,
        at: DateTime<Utc>,
    ) -> anyhow::Result<UpdateOutcome>;

    /// Removes the item with its comments, likes and registrations.
    /// Returns false when nothing matched.
    async fn delete(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<bool>;

    /// `None` when the item does not exist, otherwise whether `user` now likes it.
    async fn toggle_like(
        &self,
        kind: ContentKind,
        id: Uuid,
        user: Uuid,
    ) -> anyhow::Result<Option<bool>>;

    /// Returns false when the item does not exist.
    async fn append_comment(
        &self,
        kind: ContentKind,
        item_id: Uuid,
        comment: NewComment,
    ) -> anyhow::Result<bool>;

    /// Capacity check and insertion happen under the same lock.
    async fn register(
        &self,
        event_id: Uuid,
        user: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<RegisterOutcome>;

    async fn cancel_registration(&self, event_id: Uuid, user: Uuid)
        -> anyhow::Result<CancelOutcome>;
}

/// Stored account including the password hash.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns false when the email is already taken.
    async fn insert(&self, record: UserRecord) -> anyhow::Result<bool>;
    /// `email` is matched exactly; callers normalize it first.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
}
