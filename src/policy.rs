//! Request filters: session resolution and access control.
//!
//! A filter wraps the rest of the chain. It either updates the request and
//! calls `next`, or returns a declared failure without calling it.

use std::fmt;
use std::rc::Rc;

use crate::error::{HandlerResult, HttpFailure};
use crate::request::Request;
use crate::session::User;
use crate::store::Store;

/// The remaining chain, ending in the handler operation.
pub type Next<'a> = &'a dyn Fn(&mut Request) -> HandlerResult;

/// A pre-processing step around a handler operation.
pub trait Filter {
    /// Runs the filter. Call `next(req)` to continue the chain.
    fn apply(&self, req: &mut Request, next: Next<'_>) -> HandlerResult;

    /// Short description for logs.
    fn label(&self) -> String;
}

/// Resolves the session cookie to a [`User`].
///
/// Looks up the `<prefix>sessionid` cookie, the session row for its token,
/// then the user row for the session's user name. If any of these is
/// missing the request stays anonymous; this filter never raises a
/// declared failure. Store errors are faults.
pub struct FindUser {
    store: Rc<dyn Store>,
    cookie_name: String,
}

impl FindUser {
    /// Creates the filter. The cookie looked up is `<cookie_prefix>sessionid`.
    pub fn new(store: Rc<dyn Store>, cookie_prefix: &str) -> Self {
        Self {
            store,
            cookie_name: format!("{}sessionid", cookie_prefix),
        }
    }

    /// Returns the session cookie name.
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn resolve(&self, req: &Request) -> Result<Option<User>, crate::error::Failure> {
        let Some(token) = req.cookies().get(&self.cookie_name) else {
            return Ok(None);
        };
        let Some(session) = self.store.find_session(token)? else {
            req.log().debug(format_args!("no session for cookie token"));
            return Ok(None);
        };
        let Some(record) = self.store.find_user(&session.name)? else {
            req.log()
                .debug(format_args!("session names unknown user {}", session.name));
            return Ok(None);
        };
        Ok(Some(User::from_record(record).with_sessionid(token)))
    }
}

impl fmt::Debug for FindUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindUser")
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl Filter for FindUser {
    fn apply(&self, req: &mut Request, next: Next<'_>) -> HandlerResult {
        if let Some(user) = self.resolve(req)? {
            req.set_user(user);
        }
        next(req)
    }

    fn label(&self) -> String {
        format!("find_user({})", self.cookie_name)
    }
}

/// Rejects anonymous requests with `401 Not logged in`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequireUser;

impl Filter for RequireUser {
    fn apply(&self, req: &mut Request, next: Next<'_>) -> HandlerResult {
        if req.user().is_none() {
            return Err(HttpFailure::not_logged_in().into());
        }
        next(req)
    }

    fn label(&self) -> String {
        "require_user".to_string()
    }
}

/// Admits only users holding at least one of a set of roles.
///
/// Anonymous requests get `401 Not logged in`; users holding none of the
/// roles get `401 Not authorized for this page`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireRole {
    roles: Vec<String>,
}

impl RequireRole {
    /// Accepts a user holding any of `roles`.
    pub fn any_of<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the acceptable roles.
    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

impl Filter for RequireRole {
    fn apply(&self, req: &mut Request, next: Next<'_>) -> HandlerResult {
        let Some(user) = req.user() else {
            return Err(HttpFailure::not_logged_in().into());
        };
        if !user.has_role(&self.roles) {
            req.log().debug(format_args!(
                "user {} lacks any of {:?}",
                user.name(),
                self.roles
            ));
            return Err(HttpFailure::not_authorized().into());
        }
        next(req)
    }

    fn label(&self) -> String {
        format!("require_role({})", self.roles.join(","))
    }
}
