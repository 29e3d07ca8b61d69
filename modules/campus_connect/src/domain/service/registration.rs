use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{db_err, Service};
use crate::contract::model::{Caller, ContentItem, ContentKind};
use crate::domain::error::DomainError;
use crate::domain::repo::{CancelOutcome, RegisterOutcome};

impl Service {
    /// NotRegistered -> Registered. Past events and full events refuse.
    #[instrument(
        name = "campus_connect.service.register_for_event",
        skip(self),
        fields(event_id = %event_id, user_id = %caller.user_id)
    )]
    pub async fn register_for_event(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, DomainError> {
        match self
            .content
            .register(event_id, caller.user_id, Utc::now())
            .await
            .map_err(db_err)?
        {
            RegisterOutcome::Registered => {
                info!("registered for event");
                self.reload(ContentKind::Event, event_id).await
            }
            RegisterOutcome::NotFound => {
                Err(DomainError::content_not_found(ContentKind::Event, event_id))
            }
            RegisterOutcome::Closed => Err(DomainError::EventClosed),
            RegisterOutcome::AlreadyRegistered => Err(DomainError::AlreadyRegistered),
            RegisterOutcome::Full { limit } => Err(DomainError::CapacityExceeded { limit }),
        }
    }

    /// Registered -> NotRegistered. Allowed after the event date.
    #[instrument(
        name = "campus_connect.service.cancel_registration",
        skip(self),
        fields(event_id = %event_id, user_id = %caller.user_id)
    )]
    pub async fn cancel_registration(
        &self,
        caller: &Caller,
        event_id: Uuid,
    ) -> Result<ContentItem, DomainError> {
        match self
            .content
            .cancel_registration(event_id, caller.user_id)
            .await
            .map_err(db_err)?
        {
            CancelOutcome::Cancelled => {
                info!("registration cancelled");
                self.reload(ContentKind::Event, event_id).await
            }
            CancelOutcome::NotFound => {
                Err(DomainError::content_not_found(ContentKind::Event, event_id))
            }
            CancelOutcome::NotRegistered => Err(DomainError::NotRegistered),
        }
    }
}
