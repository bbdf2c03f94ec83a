//! events.rs
//!
//! Event lifecycle: create (persist, then notify), read, list, patch and
//! delete. Persisting and notifying are two independent steps; a failed
//! notification is logged and the stored event stays.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::merge::merge_event;
use super::ServiceError;
use crate::config::MessageFormat;
use crate::models::{CreateEventRequest, Event, EventPatch};
use crate::queue::{EventMessage, Notifier};
use crate::store::{ListFilter, RecordStore, StoreError};

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn RecordStore<Event>>,
    notifier: Arc<dyn Notifier>,
    message_format: MessageFormat,
}

impl EventService {
    pub fn new(
        store: Arc<dyn RecordStore<Event>>,
        notifier: Arc<dyn Notifier>,
        message_format: MessageFormat,
    ) -> Self {
        Self {
            store,
            notifier,
            message_format,
        }
    }

    pub async fn create_event(&self, req: CreateEventRequest) -> Result<Event, ServiceError> {
        let event = req.into_event(Utc::now())?;
        self.store.insert(&event).await?;
        info!(
            event_id = %event.id,
            category_id = %event.category_id,
            "Event '{}' created",
            event.name
        );

        self.notify_created(&event).await;
        Ok(event)
    }

    async fn notify_created(&self, event: &Event) {
        let result = match self.message_format {
            MessageFormat::Text => {
                self.notifier
                    .send_message(&format!("New event created: {}", event.name))
                    .await
            }
            MessageFormat::Json => {
                self.notifier
                    .send_event_message(&EventMessage {
                        event_id: event.id.to_string(),
                        event_name: event.name.clone(),
                        action: "created".to_string(),
                    })
                    .await
            }
        };

        if let Err(e) = result {
            warn!(event_id = %event.id, "Notification for new event failed: {}", e);
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Event, StoreError> {
        self.store.get_by_id(id).await
    }

    pub async fn list_events(
        &self,
        category_id: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<Event>, StoreError> {
        let filter = category_id.map(|id| ListFilter::eq("category_id", id.to_string()));
        self.store.list(filter.as_ref(), limit).await
    }

    pub async fn update_event(&self, id: Uuid, patch: &EventPatch) -> Result<Event, StoreError> {
        let existing = self.store.get_by_id(id).await?;
        let updated = merge_event(existing, patch, Utc::now());
        self.store.put(&updated).await?;
        info!(event_id = %id, status = %updated.status, "Event updated");
        Ok(updated)
    }

    /// Fails with [`StoreError::NotFound`] when there is nothing to delete.
    pub async fn delete_event(&self, id: Uuid) -> Result<(), StoreError> {
        self.store.get_by_id(id).await?;
        self.store.delete(id).await?;
        info!(event_id = %id, "Event deleted");
        Ok(())
    }
}
