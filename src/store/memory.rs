use std::cell::RefCell;
use std::collections::BTreeMap;

use super::{AdminStore, NewUser, Store, StoreError, TableStatus, UserRecord};
use crate::session::Session;

/// In-memory store for tests and local experiments.
///
/// Tables always "exist". Password digests are kept; [`credentials`](Self::credentials)
/// reads them back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RefCell<BTreeMap<String, (UserRecord, String, String)>>,
    sessions: RefCell<BTreeMap<String, Session>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with the given comma-joined role string.
    pub fn with_user(self, name: &str, email: &str, roles: &str) -> Self {
        let record = UserRecord {
            name: name.to_string(),
            email: email.to_string(),
            roles: roles.to_string(),
            tzname: None,
        };
        self.users
            .borrow_mut()
            .insert(name.to_string(), (record, String::new(), String::new()));
        self
    }

    /// Adds a session for `name` under token `sessionid`.
    pub fn with_session(self, sessionid: &str, name: &str) -> Self {
        self.sessions.borrow_mut().insert(
            sessionid.to_string(),
            Session {
                sessionid: sessionid.to_string(),
                name: name.to_string(),
                ipaddr: None,
                starttime: 0.0,
                refreshtime: 0.0,
            },
        );
        self
    }

    /// Returns the stored `(password digest, salt)` of a user.
    pub fn credentials(&self, name: &str) -> Option<(String, String)> {
        self.users
            .borrow()
            .get(name)
            .map(|(_, hash, salt)| (hash.clone(), salt.clone()))
    }

    /// Returns the number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.borrow().len()
    }
}

impl Store for MemoryStore {
    fn find_session(&self, sessionid: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.borrow().get(sessionid).cloned())
    }

    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self
            .users
            .borrow()
            .get(name)
            .map(|(record, _, _)| record.clone()))
    }
}

impl AdminStore for MemoryStore {
    fn create_tables(&self) -> Result<Vec<TableStatus>, StoreError> {
        Ok(["users", "sessions", "uploads"]
            .into_iter()
            .map(|name| TableStatus {
                name,
                created: false,
            })
            .collect())
    }

    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        let mut users = self.users.borrow_mut();
        if users.contains_key(&user.name) {
            return Err(StoreError::Backend(format!(
                "duplicate user name: {}",
                user.name
            )));
        }
        let record = UserRecord {
            name: user.name.clone(),
            email: user.email.clone(),
            roles: user.roles.clone(),
            tzname: None,
        };
        users.insert(
            user.name.clone(),
            (record, user.password_hash.clone(), user.salt.clone()),
        );
        Ok(())
    }

    fn set_roles(&self, name: &str, roles: &str) -> Result<bool, StoreError> {
        match self.users.borrow_mut().get_mut(name) {
            Some((record, _, _)) => {
                record.roles = roles.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn set_password(
        &self,
        name: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, StoreError> {
        match self.users.borrow_mut().get_mut(name) {
            Some((_, hash, pwsalt)) => {
                *hash = password_hash.to_string();
                *pwsalt = salt.to_string();
            }
            None => return Ok(false),
        }
        self.sessions.borrow_mut().retain(|_, s| s.name != name);
        Ok(true)
    }

    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .borrow_mut()
            .insert(session.sessionid.clone(), session.clone());
        Ok(())
    }

    fn delete_sessions_before(&self, cutoff: f64) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.borrow_mut();
        let before = sessions.len();
        sessions.retain(|_, s| s.refreshtime >= cutoff);
        Ok(before - sessions.len())
    }
}
