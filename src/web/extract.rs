//! Extraction boundary between a transport and the dispatcher.

use crate::request::Request;

/// Builds a [`Request`] from a transport-specific request shape.
///
/// Implementations must be total: any input, including one missing every
/// field, produces a request (with defaults) rather than an error.
///
/// # Examples
///
/// ```
/// use tinyapp::web::ExtractRequest;
/// use tinyapp::Request;
///
/// struct CgiLine {
///     method: String,
///     path: String,
/// }
///
/// impl ExtractRequest for CgiLine {
///     fn extract_request(&self) -> Request {
///         Request::new(&self.method, &self.path)
///     }
/// }
///
/// let line = CgiLine { method: "GET".into(), path: "/".into() };
/// assert_eq!(line.extract_request().path(), "/");
/// ```
pub trait ExtractRequest {
    /// Normalizes `self` into a fresh request.
    fn extract_request(&self) -> Request;
}
