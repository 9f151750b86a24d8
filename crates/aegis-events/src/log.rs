//! Bounded in-memory ring of recent workflow events.

use crate::emitter::{EventListener, ListenerResult, WorkflowEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

const DEFAULT_MAX_SIZE: usize = 100;

/// Ring buffer holding at most `max_size` events; the oldest event is
/// evicted when full. Reads take a snapshot under the lock.
pub struct EventLog {
    events: Mutex<VecDeque<WorkflowEvent>>,
    max_size: usize,
}

impl EventLog {
    pub fn new(max_size: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    /// The most recent events, newest first, optionally filtered by
    /// event type and truncated to `limit`.
    pub fn get_recent(&self, limit: usize, event_type: Option<&str>) -> Vec<WorkflowEvent> {
        let events = self.events.lock();
        events
            .iter()
            .rev()
            .filter(|event| event_type.map_or(true, |t| event.event_type == t))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

#[async_trait]
impl EventListener for EventLog {
    async fn on_event(&self, event: &WorkflowEvent) -> ListenerResult {
        let mut events = self.events.lock();
        if events.len() == self.max_size {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(())
    }
}
