use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use engine_logging::engine_log;
use log::Level;

use crate::EngineEvent;

/// Destination for engine events; the loops never block on it.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: Sender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Arc<Self>, Receiver<EngineEvent>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        // A dropped receiver just means nobody is watching anymore.
        let _ = self.tx.send(event);
    }
}

/// Writes `message` to the log and forwards it as a `Log` event.
pub fn report(sink: &dyn EventSink, level: Level, message: impl Into<String>) {
    let message = message.into();
    engine_log!(level, "{message}");
    sink.emit(EngineEvent::Log { level, message });
}
