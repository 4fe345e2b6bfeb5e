use crate::ports::{EngineEvent, EventBus};

/// Forwards events into a `flume` channel drained by the front-end.
#[derive(Debug, Clone)]
pub struct FlumeEventBus {
    sender: flume::Sender<EngineEvent>,
}

impl FlumeEventBus {
    pub fn new() -> (Self, flume::Receiver<EngineEvent>) {
        let (sender, receiver) = flume::unbounded();
        (Self { sender }, receiver)
    }
}

impl EventBus for FlumeEventBus {
    fn emit(&self, event: EngineEvent) {
        log::debug!("Emitting {}", event.name());
        if self.sender.send(event).is_err() {
            log::trace!("Event receiver dropped; event discarded");
        }
    }
}

/// Drops every event.
#[derive(Debug, Clone, Default)]
pub struct NullEventBus;

impl EventBus for NullEventBus {
    fn emit(&self, _event: EngineEvent) {}
}
