use crate::frame::Frame;

/// What happened to a camera in the overlay pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Promoted into the active set; an image fetch was requested.
    Admitted,
    /// Image fetch succeeded; the camera is displayable.
    Activated,
    /// Left the visible set and was released.
    Evicted,
    /// Removed at random to get back under the active-set bound.
    Pruned,
    /// Image fetch failed; the camera was dropped from the active set.
    FetchFailed,
    /// A fetch resolved after its camera was evicted; the result was discarded.
    StaleCompletion,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Admitted => "admitted",
            EventKind::Activated => "activated",
            EventKind::Evicted => "evicted",
            EventKind::Pruned => "pruned",
            EventKind::FetchFailed => "fetch_failed",
            EventKind::StaleCompletion => "stale_completion",
        }
    }
}

/// Event record for traceability, stamped with the frame it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub frame_index: u64,
    pub kind: EventKind,
    pub subject: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<Event>,
    capacity: Option<usize>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `capacity` events, dropping the oldest.
    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            events: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn emit(&mut self, frame: Frame, kind: EventKind, subject: impl Into<String>) {
        self.events.push(Event {
            frame_index: frame.index,
            kind,
            subject: subject.into(),
        });
        if let Some(cap) = self.capacity
            && self.events.len() > cap
        {
            let excess = self.events.len() - cap;
            self.events.drain(..excess);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}
