use std::collections::{BTreeSet, HashMap};

use anyhow::{anyhow, Context};
use uuid::Uuid;

use crate::contract::model::{
    Comment, ContentDetails, ContentItem, ContentKind, EventDetails, ResourceDetails, Role, User,
    UserRef,
};
use crate::infra::storage::entity::{comment, content_item, user};

pub fn user_to_contract(row: user::Model) -> anyhow::Result<User> {
    let role = parse_role(&row.role)?;
    Ok(User {
        id: row.id,
        name: row.name,
        email: row.email,
        role,
        created_at: row.created_at,
    })
}

pub fn user_ref(row: &user::Model) -> UserRef {
    UserRef {
        id: row.id,
        name: Some(row.name.clone()),
        role: row.role.parse().ok(),
    }
}

fn parse_role(s: &str) -> anyhow::Result<Role> {
    s.parse::<Role>().map_err(|e| anyhow!(e))
}

/// Author and participant lookups for one batch of items.
pub struct People(HashMap<Uuid, UserRef>);

impl People {
    pub fn new(rows: &[user::Model]) -> Self {
        Self(rows.iter().map(|u| (u.id, user_ref(u))).collect())
    }

    pub fn get(&self, id: Uuid) -> UserRef {
        self.0
            .get(&id)
            .cloned()
            .unwrap_or_else(|| UserRef::unresolved(id))
    }
}

/// Children of one item, already in display order.
#[derive(Default)]
pub struct Children {
    pub comments: Vec<comment::Model>,
    pub likes: BTreeSet<Uuid>,
    pub registrants: Vec<Uuid>,
}

pub fn content_to_contract(
    row: content_item::Model,
    children: Children,
    people: &People,
) -> anyhow::Result<ContentItem> {
    let kind: ContentKind = row
        .kind
        .parse()
        .map_err(|e: String| anyhow!(e))
        .with_context(|| format!("content item {}", row.id))?;

    let details = match kind {
        ContentKind::Announcement => ContentDetails::Announcement,
        ContentKind::Event => ContentDetails::Event(EventDetails {
            date: row
                .event_date
                .ok_or_else(|| anyhow!("event {} has no date", row.id))?,
            location: row.location.unwrap_or_default(),
            registration_limit: row
                .registration_limit
                .unwrap_or(0)
                .clamp(0, i64::from(u32::MAX)) as u32,
            registered_users: children
                .registrants
                .into_iter()
                .map(|id| people.get(id))
                .collect(),
        }),
        ContentKind::Resource => ContentDetails::Resource(ResourceDetails {
            file_url: row.file_url.unwrap_or_default(),
            category: row.category.unwrap_or_default(),
        }),
    };

    let comments = children
        .comments
        .into_iter()
        .map(|c| Comment {
            id: c.id,
            text: c.text,
            created_by: people.get(c.created_by),
            created_at: c.created_at,
        })
        .collect();

    Ok(ContentItem {
        id: row.id,
        title: row.title,
        description: row.description,
        created_by: people.get(row.created_by),
        created_at: row.created_at,
        updated_at: row.updated_at,
        details,
        comments,
        likes: children.likes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(kind: &str) -> content_item::Model {
        content_item::Model {
            id: Uuid::new_v4(),
            kind: kind.into(),
            title: "Career Fair".into(),
            description: "Hall B".into(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            event_date: Some(Utc::now()),
            location: Some("Hall B".into()),
            registration_limit: Some(25),
            file_url: None,
            category: None,
        }
    }

    #[test]
    fn missing_accounts_resolve_to_bare_refs() {
        let r = row("event");
        let author = r.created_by;
        let item = content_to_contract(
            r,
            Children {
                registrants: vec![Uuid::new_v4()],
                ..Default::default()
            },
            &People::new(&[]),
        )
        .unwrap();

        assert_eq!(item.created_by, UserRef::unresolved(author));
        let event = item.event().unwrap();
        assert_eq!(event.registration_limit, 25);
        assert_eq!(event.registered_users[0].name, None);
    }

    #[test]
    fn unknown_kind_or_dateless_event_is_an_error() {
        assert!(content_to_contract(row("poster"), Children::default(), &People::new(&[])).is_err());

        let mut r = row("event");
        r.event_date = None;
        assert!(content_to_contract(r, Children::default(), &People::new(&[])).is_err());
    }
}
