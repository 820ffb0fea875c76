//! Transport boundary.
//!
//! This module turns what a transport hands over (an environment-style
//! key/value description of one request) into a [`Request`](crate::Request).
//! It does no routing and no authentication. Those happen in
//! [`App`](crate::App) and in the route's filter chain.
//!
//! # Integration Flow
//!
//! ```text
//! transport environ
//!   ↓
//! Environ::extract_request()      (this module; never fails)
//!   ↓
//! App::handle()                   (route, filters, verb, envelope)
//!   ↓
//! Response → start_response(status, headers) + body
//! ```

mod adapter;
mod cookies;
mod extract;

pub use adapter::{Environ, HTTP_COOKIE, PATH_INFO, REQUEST_METHOD, REQUEST_URI};
pub use cookies::Cookies;
pub use extract::ExtractRequest;
