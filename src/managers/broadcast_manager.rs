// BroadcastChannelManager: tokio broadcast channel for session events
// Single Responsibility: Broadcast channel lifecycle and subscription

use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::session::SessionEvent;

/// Buffer size of the session event channel
///
/// Events are small and infrequent (one per publish or edit); lagging
/// subscribers lose the oldest ones.
const SESSION_EVENT_CAPACITY: usize = 64;

/// Manages the session event broadcast channel
///
/// The session publishes an event after every analysis publish, analysis
/// failure and segment edit. Observers (timeline view, autosave, export
/// panel) subscribe independently.
pub struct BroadcastChannelManager {
    session_events: Arc<Mutex<Option<broadcast::Sender<SessionEvent>>>>,
}

impl BroadcastChannelManager {
    /// Create a new BroadcastChannelManager with the channel uninitialized
    pub fn new() -> Self {
        Self {
            session_events: Arc::new(Mutex::new(None)),
        }
    }

    /// Initialize the session event channel
    ///
    /// Replaces any previous channel; existing subscribers see it close.
    pub fn init_session_events(&self) -> broadcast::Sender<SessionEvent> {
        let (tx, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        match self.session_events.lock() {
            Ok(mut guard) => *guard = Some(tx.clone()),
            Err(_) => log::error!("Session event channel lock poisoned in init_session_events"),
        }
        tx
    }

    /// Subscribe to session events
    ///
    /// Returns None if `init_session_events()` has not been called.
    pub fn subscribe_session_events(&self) -> Option<broadcast::Receiver<SessionEvent>> {
        self.session_events
            .lock()
            .ok()?
            .as_ref()
            .map(|tx| tx.subscribe())
    }

    /// Publish an event to every current subscriber
    ///
    /// Having no subscribers is normal and not reported.
    pub fn publish(&self, event: SessionEvent) {
        let Ok(guard) = self.session_events.lock() else {
            log::error!("Session event channel lock poisoned in publish");
            return;
        };
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(event);
        }
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
