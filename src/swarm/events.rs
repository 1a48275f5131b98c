//! Progress events emitted by the convergence loop.
//!
//! The controller reports everything it does through [`SwarmEvent`]s so
//! embedding applications can render progress however they like (terminal
//! output, dashboards, traces) without the controller doing any I/O itself.

use crate::swarm::policy::TerminationReason;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One observable step in a swarm run.
#[derive(Debug, Clone)]
pub enum SwarmEvent {
    /// A round is about to invoke its participants
    RoundStarted {
        round: usize,
        open_items: usize,
        findings: usize,
        confidence: f64,
    },
    /// A participant's contribution was merged
    ParticipantContributed {
        round: usize,
        name: String,
        findings: usize,
        new_open_items: usize,
        confidence_delta: f64,
    },
    /// A participant reported its preconditions unmet
    ParticipantSkipped { round: usize, name: String },
    /// A participant failed; its round was treated as no contribution
    ParticipantFailed {
        round: usize,
        name: String,
        error: String,
    },
    /// No participant contributed; the stall nudge was applied
    StallNudged { round: usize, confidence: f64 },
    /// The run stopped
    Terminated {
        round: usize,
        reason: TerminationReason,
    },
}

/// Event handler callback type
type EventCallback = Arc<dyn Fn(SwarmEvent) + Send + Sync>;

/// A simple event emitter that allows subscribing to and emitting events.
///
/// Callbacks are dispatched on spawned tasks so a slow subscriber never
/// blocks the loop.
pub struct EventEmitter {
    subscribers: Arc<Mutex<Vec<EventCallback>>>,
}

impl EventEmitter {
    /// Create a new event emitter
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Subscribe to events with a callback function.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// swarm.emitter.subscribe(|event| {
    ///     println!("Event: {:?}", event);
    /// }).await;
    /// ```
    pub async fn subscribe<F>(&self, callback: F)
    where
        F: Fn(SwarmEvent) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.lock().await;
        subscribers.push(Arc::new(callback));
    }

    /// Emit an event to all subscribers asynchronously.
    pub async fn emit(&self, event: SwarmEvent) {
        let subscribers = self.subscribers.lock().await.clone();

        for callback in subscribers {
            let event = event.clone();
            let callback = callback.clone();

            tokio::spawn(async move {
                callback(event);
            });
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
