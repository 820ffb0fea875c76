//! Persistent store collaborator.
//!
//! The request path only needs two lookups ([`Store`]). The admin utility
//! mutates tables directly through [`AdminStore`], bypassing HTTP.
//!
//! Roles are stored as a single comma-joined string column and parsed into
//! a set when a [`User`](crate::User) is built.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::session::Session;

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// SQLite reported an error
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A non-SQL backend failed
    #[error("store backend: {0}")]
    Backend(String),
}

/// A user row, as read on the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user name
    pub name: String,
    /// Email address
    pub email: String,
    /// Comma-joined role string
    pub roles: String,
    /// Timezone name, e.g. `"Europe/Paris"`
    pub tzname: Option<String>,
}

/// A user row about to be inserted by the admin utility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Unique user name
    pub name: String,
    /// Unique email address
    pub email: String,
    /// Hex digest of `salt:password`
    pub password_hash: String,
    /// Salt mixed into the digest
    pub salt: String,
    /// Comma-joined role string
    pub roles: String,
}

/// Whether a table existed before `create_tables` ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStatus {
    /// Table name
    pub name: &'static str,
    /// True if the table was created by this call
    pub created: bool,
}

/// Lookups the session filter performs for every request that carries a
/// session cookie.
pub trait Store {
    /// Finds the session whose token is `sessionid`.
    fn find_session(&self, sessionid: &str) -> Result<Option<Session>, StoreError>;

    /// Finds the user called `name`.
    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// Table creation and mutation used by the admin utility.
pub trait AdminStore: Store {
    /// Creates the `users`, `sessions` and `uploads` tables if missing.
    fn create_tables(&self) -> Result<Vec<TableStatus>, StoreError>;

    /// Inserts a new user.
    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError>;

    /// Replaces a user's role string. Returns false if there is no such user.
    fn set_roles(&self, name: &str, roles: &str) -> Result<bool, StoreError>;

    /// Replaces a user's password digest and salt, and deletes every session
    /// the user holds. Returns false if there is no such user.
    fn set_password(&self, name: &str, password_hash: &str, salt: &str)
        -> Result<bool, StoreError>;

    /// Inserts a session row.
    fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Deletes every session refreshed before `cutoff`. Returns the count.
    fn delete_sessions_before(&self, cutoff: f64) -> Result<usize, StoreError>;
}
