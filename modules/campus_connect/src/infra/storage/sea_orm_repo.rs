//! SeaORM-backed implementations of the storage ports.
//!
//! Every mutation runs in one transaction whose first statement is a no-op
//! `UPDATE` of the item row. On SQLite that takes the database write lock, so
//! concurrent mutations of the same item serialize and the checks that follow
//! (set membership, capacity) cannot race.

use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr, Statement, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::contract::model::{ContentDraft, ContentItem, ContentKind, DraftDetails, User};
use crate::domain::repo::{
    CancelOutcome, ContentRepository, NewComment, RegisterOutcome, UpdateOutcome, UserRecord,
    UserRepository,
};
use crate::infra::storage::entity::{comment, content_item, like, registration, user};
use crate::infra::storage::mapper::{self, Children, People};

const LOCK_ITEM_SQL: &str = "UPDATE content_items SET id = id WHERE id = ? AND kind = ?";

const REGISTER_IF_ROOM_SQL: &str = "INSERT OR IGNORE INTO event_registrations (event_id, user_id, created_at) \
     SELECT ?, ?, ? \
     WHERE ? = 0 OR (SELECT COUNT(*) FROM event_registrations WHERE event_id = ?) < ?";

/// Takes the write lock and reports whether the item exists.
async fn lock_item<C: ConnectionTrait>(
    conn: &C,
    kind: ContentKind,
    id: Uuid,
) -> anyhow::Result<bool> {
    let res = conn
        .execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            LOCK_ITEM_SQL,
            [id.into(), kind.as_str().into()],
        ))
        .await
        .context("lock content item")?;
    Ok(res.rows_affected() == 1)
}

fn write_draft(am: &mut content_item::ActiveModel, draft: &ContentDraft) {
    am.title = Set(draft.title.clone());
    am.description = Set(draft.description.clone());

    let (event_date, location, limit, file_url, category) = match &draft.details {
        DraftDetails::Announcement => (None, None, None, None, None),
        DraftDetails::Event {
            date,
            location,
            registration_limit,
        } => (
            *date,
            Some(location.clone()),
            Some(*registration_limit),
            None,
            None,
        ),
        DraftDetails::Resource { file_url, category } => (
            None,
            None,
            None,
            Some(file_url.clone()),
            Some(category.clone()),
        ),
    };
    am.event_date = Set(event_date);
    am.location = Set(location);
    am.registration_limit = Set(limit);
    am.file_url = Set(file_url);
    am.category = Set(category);
}

/// Attach comments, likes, registrations and author refs to `rows`, keeping their order.
async fn hydrate<C: ConnectionTrait>(
    conn: &C,
    rows: Vec<content_item::Model>,
) -> anyhow::Result<Vec<ContentItem>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let comments = comment::Entity::find()
        .filter(comment::Column::ItemId.is_in(ids.clone()))
        .order_by_asc(comment::Column::Seq)
        .all(conn)
        .await
        .context("load comments")?;
    let likes = like::Entity::find()
        .filter(like::Column::ItemId.is_in(ids.clone()))
        .all(conn)
        .await
        .context("load likes")?;
    let registrations = registration::Entity::find()
        .filter(registration::Column::EventId.is_in(ids))
        .order_by_asc(registration::Column::CreatedAt)
        .all(conn)
        .await
        .context("load registrations")?;

    let mut people: HashSet<Uuid> = rows.iter().map(|r| r.created_by).collect();
    people.extend(comments.iter().map(|c| c.created_by));
    people.extend(registrations.iter().map(|r| r.user_id));
    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(people))
        .all(conn)
        .await
        .context("load users")?;
    let people = People::new(&users);

    let mut children: HashMap<Uuid, Children> = HashMap::new();
    for c in comments {
        children.entry(c.item_id).or_default().comments.push(c);
    }
    for l in likes {
        children.entry(l.item_id).or_default().likes.insert(l.user_id);
    }
    for r in registrations {
        children
            .entry(r.event_id)
            .or_default()
            .registrants
            .push(r.user_id);
    }

    rows.into_iter()
        .map(|row| {
            let ch = children.remove(&row.id).unwrap_or_default();
            mapper::content_to_contract(row, ch, &people)
        })
        .collect()
}

pub struct SeaOrmContentRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmContentRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> ContentRepository for SeaOrmContentRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn insert(
        &self,
        id: Uuid,
        author: Uuid,
        draft: &ContentDraft,
        at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut am = content_item::ActiveModel {
            id: Set(id),
            kind: Set(draft.kind().as_str().to_string()),
            created_by: Set(author),
            created_at: Set(at),
            updated_at: Set(at),
            ..Default::default()
        };
        write_draft(&mut am, draft);
        content_item::Entity::insert(am)
            .exec_without_returning(&self.conn)
            .await
            .context("insert content item")?;
        Ok(())
    }

    async fn find(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<ContentItem>> {
        let txn = self.conn.begin().await.context("begin read")?;
        let row = content_item::Entity::find_by_id(id)
            .filter(content_item::Column::Kind.eq(kind.as_str()))
            .one(&txn)
            .await
            .context("find content item")?;
        let item = match row {
            Some(row) => hydrate(&txn, vec![row]).await?.pop(),
            None => None,
        };
        txn.commit().await.context("end read")?;
        Ok(item)
    }

    async fn list(&self, kind: ContentKind) -> anyhow::Result<Vec<ContentItem>> {
        let txn = self.conn.begin().await.context("begin read")?;
        let rows = content_item::Entity::find()
            .filter(content_item::Column::Kind.eq(kind.as_str()))
            .order_by_desc(content_item::Column::CreatedAt)
            .order_by_desc(content_item::Column::Id)
            .all(&txn)
            .await
            .context("list content items")?;
        let items = hydrate(&txn, rows).await?;
        txn.commit().await.context("end read")?;
        Ok(items)
    }

    async fn owner_of(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<Option<Uuid>> {
        let row = content_item::Entity::find_by_id(id)
            .filter(content_item::Column::Kind.eq(kind.as_str()))
            .one(&self.conn)
            .await
            .context("find content owner")?;
        Ok(row.map(|r| r.created_by))
    }

    async fn update(
        &self,
        kind: ContentKind,
        id: Uuid,
        draft: &ContentDraft,
        at: DateTime<Utc>,
    ) -> anyhow::Result<UpdateOutcome> {
        let txn = self.conn.begin().await.context("begin update")?;
        if !lock_item(&txn, kind, id).await? {
            txn.commit().await?;
            return Ok(UpdateOutcome::NotFound);
        }

        if let DraftDetails::Event {
            registration_limit, ..
        } = &draft.details
        {
            if let Ok(limit @ 1..) = u64::try_from(*registration_limit) {
                let registered = registration::Entity::find()
                    .filter(registration::Column::EventId.eq(id))
                    .count(&txn)
                    .await
                    .context("count registrations")?;
                if registered > limit {
                    txn.commit().await?;
                    return Ok(UpdateOutcome::LimitBelowRegistrations { registered });
                }
            }
        }

        let mut am = content_item::ActiveModel {
            id: Set(id),
            updated_at: Set(at),
            ..Default::default()
        };
        write_draft(&mut am, draft);
        am.update(&txn).await.context("update content item")?;
        txn.commit().await.context("commit update")?;
        Ok(UpdateOutcome::Updated)
    }

    async fn delete(&self, kind: ContentKind, id: Uuid) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin delete")?;
        if !lock_item(&txn, kind, id).await? {
            txn.commit().await?;
            return Ok(false);
        }

        let comments = comment::Entity::delete_many()
            .filter(comment::Column::ItemId.eq(id))
            .exec(&txn)
            .await
            .context("delete comments")?;
        like::Entity::delete_many()
            .filter(like::Column::ItemId.eq(id))
            .exec(&txn)
            .await
            .context("delete likes")?;
        registration::Entity::delete_many()
            .filter(registration::Column::EventId.eq(id))
            .exec(&txn)
            .await
            .context("delete registrations")?;
        content_item::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("delete content item")?;

        txn.commit().await.context("commit delete")?;
        debug!(item_id = %id, comments = comments.rows_affected, "content item removed");
        Ok(true)
    }

    async fn toggle_like(
        &self,
        kind: ContentKind,
        id: Uuid,
        user: Uuid,
    ) -> anyhow::Result<Option<bool>> {
        let txn = self.conn.begin().await.context("begin like")?;
        if !lock_item(&txn, kind, id).await? {
            txn.commit().await?;
            return Ok(None);
        }

        let removed = like::Entity::delete_many()
            .filter(like::Column::ItemId.eq(id))
            .filter(like::Column::UserId.eq(user))
            .exec(&txn)
            .await
            .context("remove like")?
            .rows_affected;
        let liked = if removed == 0 {
            like::Entity::insert(like::ActiveModel {
                item_id: Set(id),
                user_id: Set(user),
                created_at: Set(Utc::now()),
            })
            .exec_without_returning(&txn)
            .await
            .context("add like")?;
            true
        } else {
            false
        };

        txn.commit().await.context("commit like")?;
        Ok(Some(liked))
    }

    async fn append_comment(
        &self,
        kind: ContentKind,
        item_id: Uuid,
        c: NewComment,
    ) -> anyhow::Result<bool> {
        let txn = self.conn.begin().await.context("begin comment")?;
        if !lock_item(&txn, kind, item_id).await? {
            txn.commit().await?;
            return Ok(false);
        }

        comment::Entity::insert(comment::ActiveModel {
            seq: NotSet,
            id: Set(c.id),
            item_id: Set(item_id),
            text: Set(c.text),
            created_by: Set(c.author),
            created_at: Set(c.created_at),
        })
        .exec_without_returning(&txn)
        .await
        .context("insert comment")?;

        txn.commit().await.context("commit comment")?;
        Ok(true)
    }

    async fn register(
        &self,
        event_id: Uuid,
        user: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<RegisterOutcome> {
        let txn = self.conn.begin().await.context("begin registration")?;
        if !lock_item(&txn, ContentKind::Event, event_id).await? {
            txn.commit().await?;
            return Ok(RegisterOutcome::NotFound);
        }

        let event = content_item::Entity::find_by_id(event_id)
            .one(&txn)
            .await
            .context("load event")?
            .ok_or_else(|| anyhow!("event {event_id} vanished under lock"))?;
        let date = event
            .event_date
            .ok_or_else(|| anyhow!("event {event_id} has no date"))?;
        if date < now {
            txn.commit().await?;
            return Ok(RegisterOutcome::Closed);
        }

        let existing = registration::Entity::find_by_id((event_id, user))
            .one(&txn)
            .await
            .context("check registration")?;
        if existing.is_some() {
            txn.commit().await?;
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        let limit = event.registration_limit.unwrap_or(0).max(0);
        let inserted = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                REGISTER_IF_ROOM_SQL,
                [
                    event_id.into(),
                    user.into(),
                    now.into(),
                    limit.into(),
                    event_id.into(),
                    limit.into(),
                ],
            ))
            .await
            .context("insert registration")?
            .rows_affected();
        txn.commit().await.context("commit registration")?;

        if inserted == 0 {
            return Ok(RegisterOutcome::Full {
                limit: u32::try_from(limit).unwrap_or(u32::MAX),
            });
        }
        Ok(RegisterOutcome::Registered)
    }

    async fn cancel_registration(
        &self,
        event_id: Uuid,
        user: Uuid,
    ) -> anyhow::Result<CancelOutcome> {
        let txn = self.conn.begin().await.context("begin cancellation")?;
        if !lock_item(&txn, ContentKind::Event, event_id).await? {
            txn.commit().await?;
            return Ok(CancelOutcome::NotFound);
        }

        let removed = registration::Entity::delete_many()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::UserId.eq(user))
            .exec(&txn)
            .await
            .context("delete registration")?
            .rows_affected;
        txn.commit().await.context("commit cancellation")?;

        Ok(if removed == 0 {
            CancelOutcome::NotRegistered
        } else {
            CancelOutcome::Cancelled
        })
    }
}

pub struct SeaOrmUserRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUserRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<C> UserRepository for SeaOrmUserRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn insert(&self, record: UserRecord) -> anyhow::Result<bool> {
        let u = record.user;
        let am = user::ActiveModel {
            id: Set(u.id),
            name: Set(u.name),
            email: Set(u.email),
            password_hash: Set(record.password_hash),
            role: Set(u.role.as_str().to_string()),
            created_at: Set(u.created_at),
        };
        match user::Entity::insert(am).exec_without_returning(&self.conn).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let row = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("find user by email")?;
        row.map(|r| {
            let password_hash = r.password_hash.clone();
            mapper::user_to_contract(r).map(|user| UserRecord {
                user,
                password_hash,
            })
        })
        .transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = user::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find user by id")?;
        row.map(mapper::user_to_contract).transpose()
    }
}
