use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::Mutex;

/// Ordered log of raw eSIM webhook payloads, kept for the process lifetime.
///
/// Appends and reads are serialized by a mutex. Without a capacity the log
/// grows without bound and only the read side is truncated.
#[derive(Debug, Default)]
pub struct EsimEventLog {
    events: Mutex<VecDeque<Value>>,
    capacity: Option<usize>,
}

impl EsimEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that drops its oldest entries once it holds `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity: Some(capacity),
        }
    }

    pub async fn append(&self, event: Value) {
        let mut events = self.events.lock().await;
        events.push_back(event);
        if let Some(capacity) = self.capacity {
            while events.len() > capacity {
                events.pop_front();
            }
        }
    }

    /// The last `n` events in arrival order.
    pub async fn last(&self, n: usize) -> Vec<Value> {
        let events = self.events.lock().await;
        let skip = events.len().saturating_sub(n);
        events.iter().skip(skip).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}
