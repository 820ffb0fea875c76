//! Administrative operations run from the command line: table creation,
//! user management and periodic cleanup.
//!
//! Every operation records one audit event, whatever its outcome.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditTrail};
use crate::config::AppConfig;
use crate::secret::Secret;
use crate::store::{AdminStore, NewUser, StoreError, TableStatus};

const SALT_LEN: usize = 8;

/// Why an admin operation did not complete.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// The arguments were rejected before touching the store
    #[error("{0}")]
    InvalidInput(String),
    /// The named user does not exist
    #[error("no such user: {0}")]
    NoSuchUser(String),
    /// The store failed
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A trash directory operation failed
    #[error("trash {}: {source}", path.display())]
    Trash {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
}

impl AdminError {
    fn outcome(&self) -> AuditOutcome {
        match self {
            AdminError::InvalidInput(_) | AdminError::NoSuchUser(_) => AuditOutcome::Denied,
            AdminError::Store(_) | AdminError::Trash { .. } => AuditOutcome::Error,
        }
    }
}

/// What [`Admin::cleanup`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of expired session rows deleted
    pub sessions_removed: usize,
    /// Names of trash files deleted, sorted
    pub trash_removed: Vec<String>,
}

/// Admin command runner over an [`AdminStore`].
///
/// # Example
///
/// ```
/// use tinyapp::{Admin, MemoryStore, Secret, Store};
/// use tinyapp::audit::AuditTrail;
///
/// let store = MemoryStore::new();
/// let trail = AuditTrail::new();
/// let admin = Admin::new(&store, &trail).with_actor("operator");
///
/// admin
///     .add_user("zarf", "zarf@example.com", &Secret::new("xyzzy".to_string()), "admin")
///     .unwrap();
/// assert!(store.find_user("zarf").unwrap().is_some());
/// assert_eq!(trail.last().unwrap().actor(), "operator");
/// ```
pub struct Admin<'a, S: AdminStore + ?Sized> {
    store: &'a S,
    trail: &'a AuditTrail,
    actor: String,
}

impl<'a, S: AdminStore + ?Sized> Admin<'a, S> {
    /// Creates a runner. The actor defaults to the invoking login name.
    pub fn new(store: &'a S, trail: &'a AuditTrail) -> Self {
        Self {
            store,
            trail,
            actor: current_actor(),
        }
    }

    /// Overrides the actor recorded in audit events.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// Creates any missing tables.
    pub fn create_db(&self) -> Result<Vec<TableStatus>, AdminError> {
        self.audited(AuditEventKind::Schema, "createdb", None, None, || {
            Ok(self.store.create_tables()?)
        })
    }

    /// Adds a user.
    ///
    /// Name, email and password must be nonempty, the name must not contain
    /// `@` and the email must.
    pub fn add_user(
        &self,
        name: &str,
        email: &str,
        password: &Secret<String>,
        roles: &str,
    ) -> Result<(), AdminError> {
        let (name, email, roles) = (name.trim(), email.trim(), roles.trim());
        self.audited(
            AuditEventKind::UserChange,
            "adduser",
            Some(name),
            Some(format!("email={}, roles={}", email, roles)),
            || {
                if name.is_empty() || email.is_empty() || password.is_blank() {
                    return Err(AdminError::InvalidInput(
                        "name, email, pw must be nonempty".to_string(),
                    ));
                }
                if name.contains('@') {
                    return Err(AdminError::InvalidInput(
                        "name cannot contain an \"@\" character".to_string(),
                    ));
                }
                if !email.contains('@') {
                    return Err(AdminError::InvalidInput(
                        "email must contain an \"@\" character".to_string(),
                    ));
                }
                let salt = new_salt();
                self.store.insert_user(&NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    password_hash: password.salted_digest(&salt),
                    salt,
                    roles: roles.to_string(),
                })?;
                Ok(())
            },
        )
    }

    /// Replaces a user's comma-separated role list.
    pub fn set_user_roles(&self, name: &str, roles: &str) -> Result<(), AdminError> {
        let (name, roles) = (name.trim(), roles.trim());
        self.audited(
            AuditEventKind::UserChange,
            "userroles",
            Some(name),
            Some(format!("roles={}", roles)),
            || {
                if !self.store.set_roles(name, roles)? {
                    return Err(AdminError::NoSuchUser(name.to_string()));
                }
                Ok(())
            },
        )
    }

    /// Sets a new password and logs out every session of the user.
    pub fn set_user_password(
        &self,
        name: &str,
        password: &Secret<String>,
    ) -> Result<(), AdminError> {
        let name = name.trim();
        self.audited(AuditEventKind::Credential, "userpw", Some(name), None, || {
            if name.is_empty() || password.is_blank() {
                return Err(AdminError::InvalidInput(
                    "name, pw must be nonempty".to_string(),
                ));
            }
            let salt = new_salt();
            let hash = password.salted_digest(&salt);
            if !self.store.set_password(name, &hash, &salt)? {
                return Err(AdminError::NoSuchUser(name.to_string()));
            }
            Ok(())
        })
    }

    /// Deletes expired sessions and old trash files, as of now.
    pub fn cleanup(&self, config: &AppConfig) -> Result<CleanupReport, AdminError> {
        self.cleanup_at(config, SystemTime::now())
    }

    /// Deletes sessions last refreshed more than `max_session_age` before
    /// `now`, and regular files in the trash directory last modified more
    /// than `max_trash_age` before `now`. A missing trash directory counts
    /// as empty.
    pub fn cleanup_at(
        &self,
        config: &AppConfig,
        now: SystemTime,
    ) -> Result<CleanupReport, AdminError> {
        self.audited(AuditEventKind::Cleanup, "cleanup", None, None, || {
            let session_cutoff = unix_seconds(now) - config.max_session_age as f64;
            let sessions_removed = self.store.delete_sessions_before(session_cutoff)?;

            let trash_cutoff = now
                .checked_sub(Duration::from_secs(config.max_trash_age))
                .unwrap_or(UNIX_EPOCH);
            let trash_removed = purge_trash(&config.trash_dir, trash_cutoff)?;

            Ok(CleanupReport {
                sessions_removed,
                trash_removed,
            })
        })
    }

    fn audited<T>(
        &self,
        kind: AuditEventKind,
        action: &str,
        resource: Option<&str>,
        detail: Option<String>,
        op: impl FnOnce() -> Result<T, AdminError>,
    ) -> Result<T, AdminError> {
        let result = op();
        let outcome = match &result {
            Ok(_) => AuditOutcome::Success,
            Err(e) => e.outcome(),
        };
        let mut event = AuditEvent::new(self.actor.as_str(), kind, outcome).with_action(action);
        if let Some(resource) = resource {
            event = event.with_resource_id(resource);
        }
        match (&result, detail) {
            (Err(e), _) => event = event.with_detail(e.to_string()),
            (Ok(_), Some(detail)) => event = event.with_detail(detail),
            (Ok(_), None) => {}
        }
        self.trail.record(event);
        result
    }
}

fn purge_trash(dir: &std::path::Path, cutoff: SystemTime) -> Result<Vec<String>, AdminError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!(dir = %dir.display(), "trash directory missing");
            return Ok(Vec::new());
        }
        Err(e) => return Err(trash_error(dir.to_path_buf())(e)),
    };

    let mut doomed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(trash_error(dir.to_path_buf()))?;
        let meta = entry.metadata().map_err(trash_error(entry.path()))?;
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().map_err(trash_error(entry.path()))?;
        if modified < cutoff {
            doomed.push(entry.path());
        }
    }
    doomed.sort();

    let mut removed = Vec::with_capacity(doomed.len());
    for path in doomed {
        tracing::info!(file = %path.display(), "deleting from trash");
        fs::remove_file(&path).map_err(trash_error(path.clone()))?;
        if let Some(name) = path.file_name() {
            removed.push(name.to_string_lossy().into_owned());
        }
    }
    Ok(removed)
}

fn trash_error(path: PathBuf) -> impl FnOnce(io::Error) -> AdminError {
    move |source| AdminError::Trash { path, source }
}

fn new_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

fn unix_seconds(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Login name of the invoking user, or `???`.
pub fn current_actor() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "???".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::store::{MemoryStore, Store};

    fn pw(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    #[test]
    fn add_user_validates_input() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail).with_actor("op");

        for (name, email, password) in [
            ("", "a@b", "pw"),
            ("zarf", "", "pw"),
            ("zarf", "a@b", "  "),
            ("za@rf", "a@b", "pw"),
            ("zarf", "nowhere", "pw"),
        ] {
            let err = admin.add_user(name, email, &pw(password), "").unwrap_err();
            assert!(matches!(err, AdminError::InvalidInput(_)), "{}", name);
        }
        assert!(store.find_user("zarf").unwrap().is_none());
        assert_eq!(trail.len(), 5);
        assert!(trail
            .events()
            .iter()
            .all(|e| e.outcome() == AuditOutcome::Denied));
    }

    #[test]
    fn add_user_trims_and_stores() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail).with_actor("op");
        admin
            .add_user(" zarf ", " zarf@example.com ", &pw("xyzzy"), " admin ")
            .unwrap();

        let record = store.find_user("zarf").unwrap().unwrap();
        assert_eq!(record.email, "zarf@example.com");
        assert_eq!(record.roles, "admin");

        let event = trail.last().unwrap();
        assert_eq!(event.action(), Some("adduser"));
        assert_eq!(event.resource_id(), Some("zarf"));
        assert!(!event.to_string().contains("xyzzy"));
    }

    #[test]
    fn stored_digest_is_of_trimmed_password() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail).with_actor("op");

        admin.add_user("zarf", "zarf@example.com", &pw(" xyzzy "), "").unwrap();
        let (hash, salt) = store.credentials("zarf").unwrap();
        assert_eq!(salt.len(), SALT_LEN);
        assert_eq!(hash, pw("xyzzy").salted_digest(&salt));

        admin.set_user_password("zarf", &pw("\tplugh ")).unwrap();
        let (hash, salt) = store.credentials("zarf").unwrap();
        assert_eq!(hash, pw("plugh").salted_digest(&salt));
    }

    #[test]
    fn set_roles_requires_existing_user() {
        let store = MemoryStore::new().with_user("zarf", "z@example.com", "");
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail);

        admin.set_user_roles("zarf", "filing,incoming").unwrap();
        assert_eq!(store.find_user("zarf").unwrap().unwrap().roles, "filing,incoming");

        let err = admin.set_user_roles("ghost", "admin").unwrap_err();
        assert!(matches!(err, AdminError::NoSuchUser(ref n) if n == "ghost"));
        assert_eq!(trail.last().unwrap().outcome(), AuditOutcome::Denied);
    }

    #[test]
    fn password_change_logs_user_out() {
        let store = MemoryStore::new()
            .with_user("zarf", "z@example.com", "admin")
            .with_user("clerk", "c@example.com", "filing")
            .with_session("tok-1", "zarf")
            .with_session("tok-2", "zarf")
            .with_session("tok-3", "clerk");
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail);

        admin.set_user_password("zarf", &pw("new")).unwrap();
        assert!(store.find_session("tok-1").unwrap().is_none());
        assert!(store.find_session("tok-2").unwrap().is_none());
        assert!(store.find_session("tok-3").unwrap().is_some());
        assert_eq!(trail.last().unwrap().kind(), AuditEventKind::Credential);

        assert!(matches!(
            admin.set_user_password("zarf", &pw("")),
            Err(AdminError::InvalidInput(_))
        ));
        assert!(matches!(
            admin.set_user_password("ghost", &pw("x")),
            Err(AdminError::NoSuchUser(_))
        ));
    }

    #[test]
    fn cleanup_removes_stale_sessions_and_trash() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.zip"), b"zip").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let now = SystemTime::now();
        let now_secs = unix_seconds(now);
        let store = MemoryStore::new();
        store
            .insert_session(&Session {
                sessionid: "stale".to_string(),
                name: "zarf".to_string(),
                ipaddr: None,
                starttime: now_secs - 30.0 * 86400.0,
                refreshtime: now_secs - 20.0 * 86400.0,
            })
            .unwrap();
        store
            .insert_session(&Session {
                sessionid: "fresh".to_string(),
                name: "zarf".to_string(),
                ipaddr: None,
                starttime: now_secs - 30.0 * 86400.0,
                refreshtime: now_secs - 60.0,
            })
            .unwrap();

        let config = AppConfig {
            trash_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let trail = AuditTrail::new();
        let admin = Admin::new(&store, &trail);

        // Trash file was just written, so it survives a cleanup run now.
        let report = admin.cleanup_at(&config, now).unwrap();
        assert_eq!(report.sessions_removed, 1);
        assert!(report.trash_removed.is_empty());
        assert!(store.find_session("fresh").unwrap().is_some());

        // Eight days on, it is past the seven day limit.
        let later = now + Duration::from_secs(8 * 86400);
        let report = admin.cleanup_at(&config, later).unwrap();
        assert_eq!(report.trash_removed, ["old.zip"]);
        assert!(!dir.path().join("old.zip").exists());
        assert!(dir.path().join("subdir").exists());
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn missing_trash_dir_is_empty() {
        let store = MemoryStore::new();
        let trail = AuditTrail::new();
        let config = AppConfig {
            trash_dir: PathBuf::from("/nonexistent/trash"),
            ..AppConfig::default()
        };
        let report = Admin::new(&store, &trail).cleanup(&config).unwrap();
        assert_eq!(report, CleanupReport::default());
    }

    #[test]
    fn salt_shape() {
        let salt = new_salt();
        assert_eq!(salt.len(), SALT_LEN);
        assert!(salt.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
