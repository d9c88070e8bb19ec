//! Common test utilities shared across integration tests.

use async_trait::async_trait;
use std::sync::Arc;
use stepwise::{Chain, Event, EventHandler};
use tokio::sync::Mutex;

/// Build a chain from (name, command) pairs. Panics on invalid input;
/// tests only hand it valid specs.
pub fn chain(steps: &[(&str, &str)]) -> Chain {
    let mut iter = steps.iter();
    let (name, command) = iter.next().expect("chain needs at least one step");
    let mut chain = Chain::new(*name, *command).unwrap();
    for (name, command) in iter {
        chain = chain.then(*name, *command).unwrap();
    }
    chain
}

/// Event handler that records every event it receives.
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: &Event) {
        self.events.lock().await.push(event.clone());
    }
}
