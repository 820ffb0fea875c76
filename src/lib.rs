//! A minimal synchronous web framework for a small administrative site.
//!
//! One inbound request is routed by ordered regular-expression patterns to a
//! handler, run through that route's filters, dispatched by HTTP verb, and
//! turned into exactly one response envelope, whatever happened on the way:
//!
//! - **Routing**: first matching pattern wins; no match is `404 Not Found`
//! - **Verbs**: GET, POST and HEAD are routed; anything else is `405`
//! - **Filters**: session resolution and role checks wrap the handler
//! - **Faults**: unexpected errors and panics become `500 Internal Error`
//!
//! # Core Types
//!
//! - [`App`]: the routing table and dispatcher
//! - [`Route`]: a pattern, a [`Handler`] and a [`FilterChain`]
//! - [`Request`]: request data plus the response state handlers set
//! - [`Response`]: the envelope handed to the transport
//! - [`HttpFailure`] / [`Fault`]: declared failures and undeclared faults
//! - [`Store`]: session and user lookups
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//! use tinyapp::{App, FilterChain, Handler, HandlerResult, MemoryStore, Request, Route};
//! use tinyapp::web::{Environ, HTTP_COOKIE};
//!
//! struct Incoming;
//!
//! impl Handler for Incoming {
//!     fn get(&self, req: &mut Request) -> HandlerResult {
//!         Ok(format!("hello {}", req.user().map(|u| u.name()).unwrap_or("?")))
//!     }
//! }
//!
//! let store = Rc::new(
//!     MemoryStore::new()
//!         .with_user("zarf", "zarf@example.com", "admin")
//!         .with_session("tok", "zarf"),
//! );
//! let app = App::new(vec![Route::new("/incoming", Incoming)
//!     .unwrap()
//!     .filters(FilterChain::new().find_user(store, "").require_role(["incoming"]))]);
//!
//! let resp = app.handle(&Environ::synthetic_get("/incoming"));
//! assert_eq!(resp.body_text(), "401 Unauthorized\n\nNot logged in");
//!
//! let resp = app.handle(&Environ::synthetic_get("/incoming").with(HTTP_COOKIE, "sessionid=tok"));
//! assert_eq!(resp.body_text(), "hello zarf");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod app;
pub mod audit;
pub mod config;
mod error;
mod gate;
mod handler;
mod logging;
mod policy;
pub mod render;
mod request;
mod response;
mod secret;
mod session;
pub mod site;
mod store;
pub mod web;

pub use admin::{current_actor, Admin, AdminError, CleanupReport};
pub use app::{App, Route, RouteError};
pub use config::{AppConfig, ConfigError};
pub use error::{
    Failure, FailureKind, Fault, FaultKind, HandlerResult, HttpFailure, INTERNAL_ERROR,
};
pub use gate::FilterChain;
pub use handler::Handler;
pub use logging::{init_subscriber, RequestLog};
pub use policy::{Filter, FindUser, Next, RequireRole, RequireUser};
pub use render::{Renderer, TeraRenderer};
pub use request::{Method, Request};
pub use response::{Response, HTML, PLAINTEXT};
pub use secret::Secret;
pub use session::{effective_roles, Session, User, ADMIN_ROLE, OPERATIONAL_ROLES};
pub use store::{
    AdminStore, MemoryStore, NewUser, SqliteStore, Store, StoreError, TableStatus, UserRecord,
};
