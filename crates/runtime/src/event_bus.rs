/// What a user-facing notification is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    ImageryDisabled,
    DownloadStarted,
    ItemFailed,
    DownloadFinished,
    DownloadFailed,
}

impl EventKind {
    /// Whether the host should block until the user acknowledges it.
    pub fn requires_acknowledgement(self) -> bool {
        matches!(self, EventKind::DownloadFailed)
    }
}

/// Notification queued for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Monotonic sequence number, starting at 0.
    pub seq: u64,
    pub kind: EventKind,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, kind: EventKind, message: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            seq,
            kind,
            message: message.into(),
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
