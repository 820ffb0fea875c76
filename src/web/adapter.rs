//! Environment-style request description, as handed over by a CGI/WSGI-like
//! transport.

use std::collections::HashMap;

use crate::request::Request;

use super::ExtractRequest;

/// Key holding the method.
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
/// Key holding the path used for routing.
pub const PATH_INFO: &str = "PATH_INFO";
/// Key holding the originating URI.
pub const REQUEST_URI: &str = "REQUEST_URI";
/// Key holding the raw `Cookie:` header.
pub const HTTP_COOKIE: &str = "HTTP_COOKIE";

/// Key/value description of one inbound request.
///
/// # Examples
///
/// ```
/// use tinyapp::web::{Environ, ExtractRequest};
///
/// let environ = Environ::new()
///     .with("REQUEST_METHOD", "POST")
///     .with("PATH_INFO", "/upload")
///     .with("REQUEST_URI", "/upload?dir=games")
///     .with("HTTP_COOKIE", "ifarch_sessionid=abc");
///
/// let req = environ.extract_request();
/// assert_eq!(req.path(), "/upload");
/// assert_eq!(req.uri(), "/upload?dir=games");
/// assert_eq!(req.cookies().get("ifarch_sessionid"), Some("abc"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
    vars: HashMap<String, String>,
}

impl Environ {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describes a GET of `uri`, used by the admin entry point.
    pub fn synthetic_get(uri: &str) -> Self {
        Self::new()
            .with(REQUEST_METHOD, "GET")
            .with(PATH_INFO, uri)
            .with(REQUEST_URI, uri)
    }

    /// Sets a key, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Returns the value of a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environ {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ExtractRequest for Environ {
    fn extract_request(&self) -> Request {
        let method = self.get(REQUEST_METHOD).unwrap_or("?");
        let path = self.get(PATH_INFO).unwrap_or("");
        let uri = self.get(REQUEST_URI).unwrap_or(path);

        let req = Request::new(method, path).with_uri(uri);
        match self.get(HTTP_COOKIE) {
            Some(header) => req.with_cookie_header(header),
            None => req,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[test]
    fn empty_environ_uses_defaults() {
        let req = Environ::new().extract_request();
        assert_eq!(req.method(), &Method::Other("?".to_string()));
        assert_eq!(req.path(), "");
        assert_eq!(req.uri(), "");
        assert!(req.cookies().is_empty());
    }

    #[test]
    fn uri_falls_back_to_path() {
        let req = Environ::new()
            .with(REQUEST_METHOD, "GET")
            .with(PATH_INFO, "/files")
            .extract_request();
        assert_eq!(req.uri(), "/files");
    }

    #[test]
    fn synthetic_get_sets_path_and_uri() {
        let environ = Environ::synthetic_get("/admin");
        assert_eq!(environ.get(REQUEST_METHOD), Some("GET"));
        assert_eq!(environ.get(PATH_INFO), Some("/admin"));
        assert_eq!(environ.get(REQUEST_URI), Some("/admin"));
        assert_eq!(environ.get(HTTP_COOKIE), None);
    }

    #[test]
    fn collects_from_pairs() {
        let environ: Environ = [("REQUEST_METHOD", "HEAD"), ("PATH_INFO", "/")]
            .into_iter()
            .collect();
        assert_eq!(environ.extract_request().method(), &Method::Head);
    }

    #[test]
    fn malformed_cookie_yields_no_cookies() {
        let req = Environ::synthetic_get("/")
            .with(HTTP_COOKIE, "a=1; garbage")
            .extract_request();
        assert!(req.cookies().is_empty());
    }
}
