//! Audit event schema.
//!
//! Events carry only identifiers: user names, role strings, counts. Never
//! passwords or their hashes.

use std::fmt;

/// Kind of administrative change being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// Table creation
    Schema,
    /// User added or roles changed
    UserChange,
    /// Password changed
    Credential,
    /// Expired sessions or trash removed
    Cleanup,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::Schema => write!(f, "schema"),
            AuditEventKind::UserChange => write!(f, "user_change"),
            AuditEventKind::Credential => write!(f, "credential"),
            AuditEventKind::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Outcome of an audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Operation succeeded
    Success,
    /// Operation was refused (bad input, unknown user)
    Denied,
    /// Operation failed due to error
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// One administrative action, as recorded in the [`AuditTrail`](super::AuditTrail).
///
/// # Example
///
/// ```
/// use tinyapp::audit::{AuditEvent, AuditEventKind, AuditOutcome};
///
/// let event = AuditEvent::new("operator", AuditEventKind::UserChange, AuditOutcome::Success)
///     .with_action("userroles")
///     .with_resource_id("zarf")
///     .with_detail("roles=admin");
///
/// assert_eq!(event.actor(), "operator");
/// assert_eq!(
///     event.to_string(),
///     "AuditEvent[kind=user_change, outcome=success, actor=operator, action=userroles, resource_id=zarf, detail=roles=admin]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Login name of whoever ran the command, `???` if unknown
    actor: String,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    /// Command name, e.g. "adduser"
    action: Option<String>,
    /// The affected user name or table
    resource_id: Option<String>,
    /// Extra context safe to log
    detail: Option<String>,
}

impl AuditEvent {
    /// Creates an event with the required fields.
    pub fn new(actor: impl Into<String>, kind: AuditEventKind, outcome: AuditOutcome) -> Self {
        Self {
            actor: actor.into(),
            kind,
            outcome,
            action: None,
            resource_id: None,
            detail: None,
        }
    }

    /// Sets the command name.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the affected resource.
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Sets extra detail. Must not contain credentials.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the actor.
    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Returns the event kind.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the command name, if set.
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Returns the affected resource, if set.
    pub fn resource_id(&self) -> Option<&str> {
        self.resource_id.as_deref()
    }

    /// Returns the detail, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, actor={}",
            self.kind, self.outcome, self.actor
        )?;
        if let Some(action) = &self.action {
            write!(f, ", action={}", action)?;
        }
        if let Some(resource_id) = &self.resource_id {
            write!(f, ", resource_id={}", resource_id)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_and_outcome_display() {
        assert_eq!(AuditEventKind::UserChange.to_string(), "user_change");
        assert_eq!(AuditEventKind::Cleanup.to_string(), "cleanup");
        assert_eq!(AuditOutcome::Denied.to_string(), "denied");
    }

    #[test]
    fn minimal_event() {
        let event = AuditEvent::new("???", AuditEventKind::Schema, AuditOutcome::Success);
        assert_eq!(event.actor(), "???");
        assert!(event.action().is_none());
        assert!(event.resource_id().is_none());
        assert_eq!(
            event.to_string(),
            "AuditEvent[kind=schema, outcome=success, actor=???]"
        );
    }

    #[test]
    fn builder_fills_optional_fields() {
        let event = AuditEvent::new("op", AuditEventKind::Credential, AuditOutcome::Denied)
            .with_action("userpw")
            .with_resource_id("ghost")
            .with_detail("no such user");
        assert_eq!(event.kind(), AuditEventKind::Credential);
        assert_eq!(event.outcome(), AuditOutcome::Denied);
        assert_eq!(event.action(), Some("userpw"));
        assert_eq!(event.resource_id(), Some("ghost"));
        assert_eq!(event.detail(), Some("no such user"));
    }
}
