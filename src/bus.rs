use std::sync::{Arc, Mutex};

use crate::module::ModuleId;

/// Event published on the station's notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationEvent {
    /// An equipment module's observable state changed value.
    ModuleChanged(ModuleId),
    /// The spectrum analyzer's control state changed value.
    AnalyzerChanged,
    /// One simulation tick finished.
    TickCompleted { tick: u64 },
}

/// Publish/subscribe channel owned by the simulation root.
///
/// Modules receive an [`EventPublisher`] handle at construction time instead
/// of reaching for a global; anything interested in state changes calls
/// [`EventBus::subscribe`] and drains its own receiver. Publishing never
/// blocks the tick; disconnected subscribers are dropped on the next publish.
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<flume::Sender<StationEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn subscribe(&self) -> flume::Receiver<StationEvent> {
        let (tx, rx) = flume::unbounded();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Handle a module keeps to announce its own state changes.
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            subscribers: self.subscribers.clone(),
        }
    }

    pub fn publish(&self, event: StationEvent) {
        publish_to(&self.subscribers, event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheaply cloneable publishing end of the notification channel.
#[derive(Clone)]
pub struct EventPublisher {
    subscribers: Arc<Mutex<Vec<flume::Sender<StationEvent>>>>,
}

impl EventPublisher {
    pub fn publish(&self, event: StationEvent) {
        publish_to(&self.subscribers, event);
    }
}

fn publish_to(subscribers: &Mutex<Vec<flume::Sender<StationEvent>>>, event: StationEvent) {
    if let Ok(mut subscribers) = subscribers.lock() {
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
