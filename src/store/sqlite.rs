use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use super::{AdminStore, NewUser, Store, StoreError, TableStatus, UserRecord};
use crate::session::Session;

const TABLES: [(&str, &str); 3] = [
    (
        "users",
        "CREATE TABLE users(name unique, email unique, pw, pwsalt, roles, tzname)",
    ),
    (
        "sessions",
        "CREATE TABLE sessions(name, sessionid unique, ipaddr, starttime, refreshtime)",
    ),
    (
        "uploads",
        "CREATE TABLE uploads(uploadtime, md5, size, filename, origfilename, donorname, \
         donoremail, donorip, donoruseragent, permission, suggestdir, ifdbid, about)",
    ),
];

/// SQLite-backed store.
///
/// Holds one connection; open one store per process (or per worker).
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    fn table_names(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

impl Store for SqliteStore {
    fn find_session(&self, sessionid: &str) -> Result<Option<Session>, StoreError> {
        let session = self
            .conn
            .query_row(
                "SELECT name, ipaddr, starttime, refreshtime FROM sessions WHERE sessionid = ?1",
                params![sessionid],
                |row| {
                    Ok(Session {
                        sessionid: sessionid.to_string(),
                        name: row.get(0)?,
                        ipaddr: row.get(1)?,
                        starttime: row.get(2)?,
                        refreshtime: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(session)
    }

    fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let record = self
            .conn
            .query_row(
                "SELECT email, roles, tzname FROM users WHERE name = ?1",
                params![name],
                |row| {
                    Ok(UserRecord {
                        name: name.to_string(),
                        email: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                        roles: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                        tzname: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

impl AdminStore for SqliteStore {
    fn create_tables(&self) -> Result<Vec<TableStatus>, StoreError> {
        let existing = self.table_names()?;
        let mut statuses = Vec::with_capacity(TABLES.len());
        for (name, ddl) in TABLES {
            let created = !existing.iter().any(|t| t == name);
            if created {
                self.conn.execute(ddl, [])?;
            }
            statuses.push(TableStatus { name, created });
        }
        Ok(statuses)
    }

    fn insert_user(&self, user: &NewUser) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO users (name, email, pw, pwsalt, roles) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![user.name, user.email, user.password_hash, user.salt, user.roles],
        )?;
        Ok(())
    }

    fn set_roles(&self, name: &str, roles: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE users SET roles = ?1 WHERE name = ?2",
            params![roles, name],
        )?;
        Ok(changed > 0)
    }

    fn set_password(
        &self,
        name: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, StoreError> {
        if self.find_user(name)?.is_none() {
            return Ok(false);
        }
        // Old sessions were opened with the old password.
        self.conn
            .execute("DELETE FROM sessions WHERE name = ?1", params![name])?;
        self.conn.execute(
            "UPDATE users SET pw = ?1, pwsalt = ?2 WHERE name = ?3",
            params![password_hash, salt, name],
        )?;
        Ok(true)
    }

    fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO sessions (name, sessionid, ipaddr, starttime, refreshtime) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.name,
                session.sessionid,
                session.ipaddr,
                session.starttime,
                session.refreshtime
            ],
        )?;
        Ok(())
    }

    fn delete_sessions_before(&self, cutoff: f64) -> Result<usize, StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM sessions WHERE refreshtime < ?1",
            params![cutoff],
        )?;
        Ok(removed)
    }
}
