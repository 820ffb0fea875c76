//! Audit trail for administrative changes.
//!
//! Every admin command (table creation, user and role changes, password
//! changes, cleanup) records one [`AuditEvent`] per attempt, whether it
//! succeeded, was refused or failed.

mod event;
mod trail;

pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;
