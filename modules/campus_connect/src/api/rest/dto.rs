use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::model::{
    AuthSession, Comment, ContentDetails, ContentDraft, ContentItem, DraftDetails, NewAccount,
    Role, User, UserRef,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoleDto {
    Student,
    Faculty,
    Admin,
}

impl From<Role> for RoleDto {
    fn from(r: Role) -> Self {
        match r {
            Role::Student => Self::Student,
            Role::Faculty => Self::Faculty,
            Role::Admin => Self::Admin,
        }
    }
}

impl From<RoleDto> for Role {
    fn from(r: RoleDto) -> Self {
        match r {
            RoleDto::Student => Self::Student,
            RoleDto::Faculty => Self::Faculty,
            RoleDto::Admin => Self::Admin,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: RoleDto,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role.into(),
            created_at: u.created_at,
        }
    }
}

/// Author or participant. `name` and `role` are omitted for deleted accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserRefDto {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RoleDto>,
}

impl From<UserRef> for UserRefDto {
    fn from(u: UserRef) -> Self {
        Self {
            id: u.id,
            name: u.name,
            role: u.role.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentDto {
    pub id: Uuid,
    pub text: String,
    pub created_by: UserRefDto,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            text: c.text,
            created_by: c.created_by.into(),
            created_at: c.created_at,
        }
    }
}

fn comments_dto(comments: Vec<Comment>) -> Vec<CommentDto> {
    comments.into_iter().map(Into::into).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: UserRefDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentDto>,
    /// Ids of users who like the announcement.
    pub likes: Vec<Uuid>,
    pub like_count: usize,
}

impl From<ContentItem> for AnnouncementDto {
    fn from(item: ContentItem) -> Self {
        let like_count = item.like_count();
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            created_by: item.created_by.into(),
            created_at: item.created_at,
            updated_at: item.updated_at,
            comments: comments_dto(item.comments),
            likes: item.likes.into_iter().collect(),
            like_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub created_by: UserRefDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub date: DateTime<Utc>,
    pub location: String,
    /// 0 means unlimited.
    pub registration_limit: u32,
    pub registered_users: Vec<UserRefDto>,
    pub registered_count: usize,
    pub comments: Vec<CommentDto>,
}

impl From<ContentItem> for EventDto {
    fn from(item: ContentItem) -> Self {
        let (date, location, registration_limit, registered) = match item.details {
            ContentDetails::Event(e) => (
                e.date,
                e.location,
                e.registration_limit,
                e.registered_users,
            ),
            _ => (item.created_at, String::new(), 0, Vec::new()),
        };
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            created_by: item.created_by.into(),
            created_at: item.created_at,
            updated_at: item.updated_at,
            date,
            location,
            registration_limit,
            registered_count: registered.len(),
            registered_users: registered.into_iter().map(Into::into).collect(),
            comments: comments_dto(item.comments),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub category: String,
    pub uploaded_by: UserRefDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub comments: Vec<CommentDto>,
    pub likes: Vec<Uuid>,
    pub like_count: usize,
}

impl From<ContentItem> for ResourceDto {
    fn from(item: ContentItem) -> Self {
        let like_count = item.like_count();
        let (file_url, category) = match item.details {
            ContentDetails::Resource(r) => (r.file_url, r.category),
            _ => (String::new(), String::new()),
        };
        Self {
            id: item.id,
            title: item.title,
            description: item.description,
            file_url,
            category,
            uploaded_by: item.created_by.into(),
            created_at: item.created_at,
            updated_at: item.updated_at,
            comments: comments_dto(item.comments),
            likes: item.likes.into_iter().collect(),
            like_count,
        }
    }
}

/// Request bodies that describe a content draft.
///
/// Text fields default to empty so that a missing field surfaces as a
/// field-level validation error rather than a body rejection. Conversion
/// never fails: the service checks the draft after authorizing the caller.
pub trait DraftRequest {
    fn into_draft(self) -> ContentDraft;
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnouncementReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl DraftRequest for AnnouncementReq {
    fn into_draft(self) -> ContentDraft {
        ContentDraft::announcement(self.title, self.description)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: String,
    /// 0 or absent means unlimited.
    #[serde(default)]
    pub registration_limit: i64,
}

impl DraftRequest for EventReq {
    fn into_draft(self) -> ContentDraft {
        ContentDraft {
            title: self.title,
            description: self.description,
            details: DraftDetails::Event {
                date: self.date,
                location: self.location,
                registration_limit: self.registration_limit,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceReq {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Link to the material; `https://` is assumed when no scheme is given.
    #[serde(default)]
    pub file_url: String,
    #[serde(default)]
    pub category: String,
}

impl DraftRequest for ResourceReq {
    fn into_draft(self) -> ContentDraft {
        ContentDraft::resource(self.title, self.description, self.file_url, self.category)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CommentReq {
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterReq {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// `student` or `faculty`.
    pub role: RoleDto,
}

impl From<RegisterReq> for NewAccount {
    fn from(req: RegisterReq) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role.into(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginReq {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer credential for the `Authorization` header.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserDto,
}

impl From<AuthSession> for AuthResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            token: s.token,
            expires_at: s.expires_at,
            user: s.user.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_request_keeps_missing_date_and_raw_limit() {
        let req: EventReq = serde_json::from_value(json!({
            "title": "Hackathon", "description": "24h", "location": "Lab 3",
            "registration_limit": -1
        }))
        .unwrap();
        assert_eq!(
            req.into_draft().details,
            DraftDetails::Event {
                date: None,
                location: "Lab 3".into(),
                registration_limit: -1,
            }
        );
    }

    #[test]
    fn missing_accounts_serialize_without_name_or_role() {
        let v = serde_json::to_value(UserRefDto::from(UserRef::unresolved(Uuid::nil()))).unwrap();
        assert_eq!(v, json!({ "id": Uuid::nil() }));
    }
}
