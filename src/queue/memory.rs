use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use super::{parse_event_messages, EventMessage, Notifier, QueueError};

/// In-process queue. Can be switched into a failing mode to exercise the
/// "notify failed after persist" path.
#[derive(Default)]
pub struct MemoryQueue {
    messages: Mutex<VecDeque<String>>,
    failing: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Snapshot of the queued bodies, oldest first.
    pub async fn messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl Notifier for MemoryQueue {
    async fn send_message(&self, message: &str) -> Result<(), QueueError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(QueueError::Send("queue unavailable".to_string()));
        }
        self.messages.lock().await.push_back(message.to_string());
        Ok(())
    }

    async fn receive_event_messages(&self, max: usize) -> Result<Vec<EventMessage>, QueueError> {
        let mut messages = self.messages.lock().await;
        let take = max.min(messages.len());
        let bodies: Vec<String> = messages.drain(..take).collect();
        Ok(parse_event_messages(bodies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn structured_messages_round_trip_and_text_is_skipped() {
        let queue = MemoryQueue::new();
        queue.send_message("New event created: Hamlet").await.unwrap();
        let msg = EventMessage {
            event_id: "550e8400-e29b-41d4-a716-446655440102".into(),
            event_name: "Hamlet".into(),
            action: "created".into(),
        };
        queue.send_event_message(&msg).await.unwrap();

        let received = queue.receive_event_messages(10).await.unwrap();
        assert_eq!(received, vec![msg]);
        assert!(queue.messages().await.is_empty());
    }

    #[tokio::test]
    async fn receive_takes_at_most_max() {
        let queue = MemoryQueue::new();
        for i in 0..3 {
            let msg = EventMessage {
                event_id: i.to_string(),
                event_name: format!("event {}", i),
                action: "created".into(),
            };
            queue.send_event_message(&msg).await.unwrap();
        }
        assert_eq!(queue.receive_event_messages(2).await.unwrap().len(), 2);
        assert_eq!(queue.receive_event_messages(0).await.unwrap().len(), 0);
        assert_eq!(queue.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn failing_queue_reports_send_error() {
        let queue = MemoryQueue::new();
        queue.set_failing(true);
        assert!(matches!(
            queue.send_message("hola").await,
            Err(QueueError::Send(_))
        ));
    }
}
