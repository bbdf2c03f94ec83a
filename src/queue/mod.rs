//! Notification queue.
//!
//! Messages are dispatched once, best effort, after a state change has been
//! persisted. A failed send never undoes the write that triggered it.

pub mod memory;

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::debug;

use crate::redis_client::RedisClient;

pub use memory::MemoryQueue;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("error sending queue message: {0}")]
    Send(String),

    #[error("error receiving queue messages: {0}")]
    Receive(String),

    #[error("error marshaling queue message: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Structured envelope for consumers that want more than a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMessage {
    pub event_id: String,
    pub event_name: String,
    pub action: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends a plain text body.
    async fn send_message(&self, message: &str) -> Result<(), QueueError>;

    /// Sends `msg` as a JSON body.
    async fn send_event_message(&self, msg: &EventMessage) -> Result<(), QueueError> {
        let body = serde_json::to_string(msg)?;
        self.send_message(&body).await
    }

    /// Takes up to `max` structured messages off the queue. Bodies that are
    /// not an [`EventMessage`] are consumed and skipped.
    async fn receive_event_messages(&self, max: usize) -> Result<Vec<EventMessage>, QueueError>;
}

pub(crate) fn parse_event_messages(bodies: Vec<String>) -> Vec<EventMessage> {
    bodies
        .iter()
        .filter_map(|body| serde_json::from_str(body).ok())
        .collect()
}

/// Queue backed by a Redis list; producers push on the right, consumers pop
/// from the left.
#[derive(Clone)]
pub struct RedisQueue {
    redis: RedisClient,
    queue_name: String,
}

impl RedisQueue {
    pub fn new(redis: RedisClient, queue_name: impl Into<String>) -> Self {
        Self {
            redis,
            queue_name: queue_name.into(),
        }
    }

    fn key(&self) -> String {
        format!("queue:{}", self.queue_name)
    }
}

#[async_trait]
impl Notifier for RedisQueue {
    async fn send_message(&self, message: &str) -> Result<(), QueueError> {
        let mut conn = self.redis.conn.clone();
        let _: i64 = conn
            .rpush(self.key(), message)
            .await
            .map_err(|e| QueueError::Send(e.to_string()))?;
        debug!(queue = %self.queue_name, "Message queued");
        Ok(())
    }

    async fn receive_event_messages(&self, max: usize) -> Result<Vec<EventMessage>, QueueError> {
        let Some(count) = NonZeroUsize::new(max) else {
            return Ok(Vec::new());
        };
        let mut conn = self.redis.conn.clone();
        let bodies: Option<Vec<String>> = conn
            .lpop(self.key(), Some(count))
            .await
            .map_err(|e| QueueError::Receive(e.to_string()))?;
        Ok(parse_event_messages(bodies.unwrap_or_default()))
    }
}
