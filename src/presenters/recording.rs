use std::sync::{Mutex, PoisonError};

use crate::engine::events::PresenterEvent;
use crate::engine::presenter::Presenter;

/// An in-memory presenter that records every notification in order.
///
/// Used by the JSON output modes and by tests.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: PresenterEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<PresenterEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Presenter for RecordingPresenter {
    fn report_field_validity(&self, field: &str, valid: bool, message: Option<&str>) {
        self.push(PresenterEvent::field_reported(field, valid, message));
    }

    fn set_busy(&self, busy: bool) {
        self.push(PresenterEvent::BusyChanged { busy });
    }

    fn on_success(&self, code: &str, timestamp: &str) {
        self.push(PresenterEvent::Succeeded {
            code: code.to_string(),
            timestamp: timestamp.to_string(),
        });
    }

    fn on_failure(&self, reason: &str) {
        self.push(PresenterEvent::Failed {
            reason: reason.to_string(),
        });
    }
}
