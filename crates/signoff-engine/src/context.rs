use crate::events::ReviewEvent;

/// Request-scoped state threaded through one host transaction.
///
/// Review events are appended here as they happen but are never emitted
/// synchronously: the caller must invoke [`Self::drain_on_commit`] only
/// after its own transaction has actually committed. Dropping the context
/// (e.g. on a rolled-back request) silently discards any queued events.
#[derive(Debug, Default)]
pub struct EngineContext {
    queued_events: Vec<ReviewEvent>,
}

impl EngineContext {
    /// Start an empty context for a new request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a review event. Not emitted until [`Self::drain_on_commit`] is called.
    pub fn queue_event(&mut self, event: ReviewEvent) {
        self.queued_events.push(event);
    }

    /// True if no review events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued_events.is_empty()
    }

    /// Take every queued event, in the order they were queued. Call this
    /// only from a before-commit hook bound to the host transaction that is
    /// about to commit.
    pub fn drain_on_commit(&mut self) -> Vec<ReviewEvent> {
        std::mem::take(&mut self.queued_events)
    }
}
