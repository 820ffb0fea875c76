use std::cell::RefCell;

use super::{AuditEvent, AuditOutcome};

/// In-memory recorder for admin audit events.
///
/// Every recorded event is also emitted as a `tracing` event on the
/// `tinyapp::audit` target: info for successes, warn otherwise.
///
/// # Example
///
/// ```
/// use tinyapp::audit::{AuditTrail, AuditEvent, AuditEventKind, AuditOutcome};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new("op", AuditEventKind::Schema, AuditOutcome::Success));
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: RefCell<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs and stores `event`.
    pub fn record(&self, event: AuditEvent) {
        match event.outcome() {
            AuditOutcome::Success => tracing::info!(target: "tinyapp::audit", "{}", event),
            _ => tracing::warn!(target: "tinyapp::audit", "{}", event),
        }
        self.events.borrow_mut().push(event);
    }

    /// Returns a snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.borrow().clone()
    }

    /// Returns the most recent event.
    pub fn last(&self) -> Option<AuditEvent> {
        self.events.borrow().last().cloned()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditEventKind;

    #[test]
    fn starts_empty() {
        let trail = AuditTrail::new();
        assert!(trail.is_empty());
        assert!(trail.last().is_none());
    }

    #[test]
    fn keeps_recording_order() {
        let trail = AuditTrail::new();
        trail.record(
            AuditEvent::new("op", AuditEventKind::UserChange, AuditOutcome::Success)
                .with_resource_id("first"),
        );
        trail.record(
            AuditEvent::new("op", AuditEventKind::Credential, AuditOutcome::Denied)
                .with_resource_id("second"),
        );

        let events = trail.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].resource_id(), Some("first"));
        assert_eq!(trail.last().unwrap().resource_id(), Some("second"));
    }
}
