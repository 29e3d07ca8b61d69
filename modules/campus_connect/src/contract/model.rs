use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Faculty => "faculty",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "faculty" => Ok(Role::Faculty),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Verified identity of whoever issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account as seen outside the module (no credential material).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Reference to a user embedded in content.
///
/// `name` and `role` are `None` when the account no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: Uuid,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl UserRef {
    pub fn unresolved(id: Uuid) -> Self {
        Self {
            id,
            name: None,
            role: None,
        }
    }
}

impl From<&User> for UserRef {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: Some(u.name.clone()),
            role: Some(u.role),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Announcement,
    Event,
    Resource,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Announcement => "announcement",
            ContentKind::Event => "event",
            ContentKind::Resource => "resource",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "announcement" => Ok(ContentKind::Announcement),
            "event" => Ok(ContentKind::Event),
            "resource" => Ok(ContentKind::Resource),
            other => Err(format!("unknown content kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub date: DateTime<Utc>,
    pub location: String,
    /// 0 means unlimited.
    pub registration_limit: u32,
    pub registered_users: Vec<UserRef>,
}

impl EventDetails {
    pub fn is_registered(&self, user_id: Uuid) -> bool {
        self.registered_users.iter().any(|u| u.id == user_id)
    }

    pub fn registered_count(&self) -> usize {
        self.registered_users.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDetails {
    pub file_url: String,
    pub category: String,
}

/// Kind-specific part of a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentDetails {
    Announcement,
    Event(EventDetails),
    Resource(ResourceDetails),
}

/// An announcement, event or resource with its comment thread and like set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: UserRef,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub details: ContentDetails,
    /// Insertion-ordered.
    pub comments: Vec<Comment>,
    pub likes: BTreeSet<Uuid>,
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self.details {
            ContentDetails::Announcement => ContentKind::Announcement,
            ContentDetails::Event(_) => ContentKind::Event,
            ContentDetails::Resource(_) => ContentKind::Resource,
        }
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: Uuid) -> bool {
        self.likes.contains(&user_id)
    }

    pub fn event(&self) -> Option<&EventDetails> {
        match &self.details {
            ContentDetails::Event(e) => Some(e),
            _ => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceDetails> {
        match &self.details {
            ContentDetails::Resource(r) => Some(r),
            _ => None,
        }
    }
}

/// Writable fields of a content item, used for create and full replacement.
///
/// Drafts are unchecked; the service validates them after authorizing the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDraft {
    pub title: String,
    pub description: String,
    pub details: DraftDetails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftDetails {
    Announcement,
    Event {
        /// Required; `None` is rejected on validation.
        date: Option<DateTime<Utc>>,
        location: String,
        /// 0 means unlimited; negative values are rejected on validation.
        registration_limit: i64,
    },
    Resource {
        file_url: String,
        category: String,
    },
}

impl ContentDraft {
    pub fn announcement(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            details: DraftDetails::Announcement,
        }
    }

    pub fn event(
        title: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
        location: impl Into<String>,
        registration_limit: u32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            details: DraftDetails::Event {
                date: Some(date),
                location: location.into(),
                registration_limit: i64::from(registration_limit),
            },
        }
    }

    pub fn resource(
        title: impl Into<String>,
        description: impl Into<String>,
        file_url: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            details: DraftDetails::Resource {
                file_url: file_url.into(),
                category: category.into(),
            },
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self.details {
            DraftDetails::Announcement => ContentKind::Announcement,
            DraftDetails::Event { .. } => ContentKind::Event,
            DraftDetails::Resource { .. } => ContentKind::Resource,
        }
    }
}

/// Self-service registration input. `role` must be student or faculty.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// A freshly issued bearer credential.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
