use dcf_store::ViewId;
use serde_json::Value;

/// Platform level changes that invalidate native rendering.
/// Each one bumps the engine's process wide system version counter.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SystemChange {
    FontScale,
    Language,
    Theme,
    Accessibility,
}

/// Inbound traffic from the native runtime.
#[derive(Debug, Clone)]
pub enum BridgeEvent {
    /// A user interaction on a native view. The engine looks up the
    /// handler registered for `(view, name)` and invokes it on the
    /// render thread.
    Event {
        view: ViewId,
        name: String,
        payload: Value,
    },
    SystemChange(SystemChange),
}

/// Sender half of the inbound channel.
/// Cheap to clone; the native glue keeps one per event source.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    sender: flume::Sender<BridgeEvent>,
}

impl EventEmitter {
    pub fn emit(&self, view: ViewId, name: impl Into<String>, payload: Value) {
        let _ = self.sender.send(BridgeEvent::Event {
            view,
            name: name.into(),
            payload,
        });
    }

    pub fn emit_system(&self, change: SystemChange) {
        let _ = self.sender.send(BridgeEvent::SystemChange(change));
    }
}

impl From<flume::Sender<BridgeEvent>> for EventEmitter {
    fn from(sender: flume::Sender<BridgeEvent>) -> Self {
        Self { sender }
    }
}

/// The inbound event channel: ordered, reliable, asynchronous.
pub fn event_channel() -> (EventEmitter, flume::Receiver<BridgeEvent>) {
    let (tx, rx) = flume::unbounded();
    (tx.into(), rx)
}
