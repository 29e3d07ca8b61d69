//! Domain service: authorization, validation and the content, interaction,
//! registration and account flows. Depends only on the ports in
//! [`crate::domain::repo`] and [`crate::domain::ports`].

use std::sync::Arc;

use uuid::Uuid;

use crate::contract::model::{Caller, ContentItem, ContentKind};
use crate::domain::error::DomainError;
use crate::domain::identity::TokenService;
use crate::domain::ports::CredentialHasher;
use crate::domain::repo::{ContentRepository, UserRepository};

mod accounts;
mod content;
mod interactions;
mod registration;
mod validation;

#[derive(Clone)]
pub struct Service {
    content: Arc<dyn ContentRepository>,
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: TokenService,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_length: usize,
    pub max_title_length: usize,
    pub max_comment_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
            max_title_length: 200,
            max_comment_length: 2000,
        }
    }
}

impl Service {
    pub fn new(
        content: Arc<dyn ContentRepository>,
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: TokenService,
        config: ServiceConfig,
    ) -> Self {
        Self {
            content,
            users,
            hasher,
            tokens,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Resolve a bearer credential into the caller it identifies.
    pub fn authenticate(&self, token: &str) -> Result<Caller, DomainError> {
        self.tokens.verify(token)
    }

    /// Re-read an item after a committed mutation. The read is a separate
    /// transaction, so it reflects the latest committed state of the item.
    async fn reload(&self, kind: ContentKind, id: Uuid) -> Result<ContentItem, DomainError> {
        self.content
            .find(kind, id)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::content_not_found(kind, id))
    }
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}
