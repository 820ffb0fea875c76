//! Per-request identity: the login session and the user it resolves to.
//!
//! Neither type is cached between requests. The session filter builds
//! them from store rows each time a request carries a session cookie.

use std::collections::BTreeSet;

use crate::store::UserRecord;

/// The role that implies every operational role.
pub const ADMIN_ROLE: &str = "admin";

/// Every role an administrator is granted on top of the stored ones.
pub const OPERATIONAL_ROLES: [&str; 4] = ["incoming", "index", "filing", "rebuild"];

/// One login session, identified by the opaque token in the session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque session token
    pub sessionid: String,
    /// Name of the user this session belongs to
    pub name: String,
    /// Address the session was started from
    pub ipaddr: Option<String>,
    /// Seconds since the epoch when the session was created
    pub starttime: f64,
    /// Seconds since the epoch when the session was last refreshed
    pub refreshtime: f64,
}

impl Session {
    /// When the session lapses if it is not refreshed again.
    pub fn expires_at(&self, max_age: f64) -> f64 {
        self.refreshtime + max_age
    }

    /// Returns true if the session has lapsed at time `now`.
    pub fn is_expired(&self, now: f64, max_age: f64) -> bool {
        self.expires_at(max_age) < now
    }
}

/// The authenticated user behind a request.
///
/// Roles are parsed from the stored comma-joined string. A user holding
/// [`ADMIN_ROLE`] also holds every entry of [`OPERATIONAL_ROLES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    name: String,
    email: String,
    role_string: String,
    roles: BTreeSet<String>,
    tzname: Option<String>,
    sessionid: Option<String>,
}

impl User {
    /// Creates a user from its name, email and stored role string.
    pub fn new(name: impl Into<String>, email: impl Into<String>, roles: &str) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role_string: roles.to_string(),
            roles: effective_roles(roles),
            tzname: None,
            sessionid: None,
        }
    }

    /// Builds a user from a store row.
    pub fn from_record(record: UserRecord) -> Self {
        let mut user = Self::new(record.name, record.email, &record.roles);
        user.tzname = record.tzname;
        user
    }

    /// Records the session token this user was resolved through.
    pub fn with_sessionid(mut self, sessionid: impl Into<String>) -> Self {
        self.sessionid = Some(sessionid.into());
        self
    }

    /// Returns the user name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the email address.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the role string exactly as stored.
    pub fn role_string(&self) -> &str {
        &self.role_string
    }

    /// Returns the effective role set.
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Returns the timezone name, if one is stored.
    pub fn tzname(&self) -> Option<&str> {
        self.tzname.as_deref()
    }

    /// Returns the session token, if the user came from a session.
    pub fn sessionid(&self) -> Option<&str> {
        self.sessionid.as_deref()
    }

    /// Returns true if the user holds any of `roles`.
    ///
    /// Matching is exact and case-sensitive against the effective role set.
    pub fn has_role<R: AsRef<str>>(&self, roles: &[R]) -> bool {
        roles.iter().any(|role| self.roles.contains(role.as_ref()))
    }
}

/// Parses a comma-joined role string into the effective role set.
///
/// Empty segments are dropped. The admin expansion is a set union, so the
/// result does not depend on the order of the input and applying it to its
/// own output changes nothing.
pub fn effective_roles(roles: &str) -> BTreeSet<String> {
    let mut set: BTreeSet<String> = roles
        .split(',')
        .filter(|role| !role.is_empty())
        .map(str::to_string)
        .collect();

    if set.contains(ADMIN_ROLE) {
        set.extend(OPERATIONAL_ROLES.iter().map(|role| role.to_string()));
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_expands_to_every_operational_role() {
        let user = User::new("zarf", "zarf@example.com", "admin");
        let expected: BTreeSet<String> = ["admin", "incoming", "index", "filing", "rebuild"]
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(user.roles(), &expected);
        assert!(user.has_role(&["rebuild"]));
    }

    #[test]
    fn plain_roles_do_not_expand() {
        let user = User::new("clerk", "clerk@example.com", "filing");
        assert!(user.has_role(&["filing"]));
        assert!(!user.has_role(&["rebuild"]));
        assert_eq!(user.roles().len(), 1);
    }

    #[test]
    fn role_matching_is_case_sensitive() {
        let user = User::new("clerk", "clerk@example.com", "filing");
        assert!(!user.has_role(&["Filing"]));
    }

    #[test]
    fn has_role_accepts_any_of_several() {
        let user = User::new("indexer", "i@example.com", "index,incoming");
        assert!(user.has_role(&["rebuild", "incoming"]));
        assert!(!user.has_role::<&str>(&[]));
    }

    #[test]
    fn empty_role_segments_are_ignored() {
        assert!(effective_roles("").is_empty());
        assert_eq!(effective_roles("filing,,index,").len(), 2);
    }

    #[test]
    fn expansion_is_idempotent() {
        let once = effective_roles("admin,filing");
        let joined: Vec<&str> = once.iter().map(String::as_str).collect();
        let twice = effective_roles(&joined.join(","));
        assert_eq!(once, twice);
    }

    #[test]
    fn from_record_keeps_tzname() {
        let user = User::from_record(UserRecord {
            name: "zarf".to_string(),
            email: "zarf@example.com".to_string(),
            roles: "index".to_string(),
            tzname: Some("America/New_York".to_string()),
        })
        .with_sessionid("tok");
        assert_eq!(user.tzname(), Some("America/New_York"));
        assert_eq!(user.sessionid(), Some("tok"));
        assert_eq!(user.role_string(), "index");
    }

    #[test]
    fn session_expiry_counts_from_refresh() {
        let session = Session {
            sessionid: "tok".to_string(),
            name: "zarf".to_string(),
            ipaddr: None,
            starttime: 100.0,
            refreshtime: 500.0,
        };
        assert_eq!(session.expires_at(60.0), 560.0);
        assert!(!session.is_expired(560.0, 60.0));
        assert!(session.is_expired(561.0, 60.0));
    }
}
