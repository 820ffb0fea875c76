use std::fmt;

use crate::logging::RequestLog;
use crate::response::HTML;
use crate::session::User;
use crate::web::Cookies;

/// HTTP method of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP HEAD
    Head,
    /// Any verb the dispatcher does not route
    Other(String),
}

impl Method {
    /// Parses a method name. Matching is case-sensitive.
    pub fn parse(method: &str) -> Self {
        match method {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "HEAD" => Method::Head,
            other => Method::Other(other.to_string()),
        }
    }

    /// Returns the method name.
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Head => "HEAD",
            Method::Other(other) => other.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One inbound request, plus the response state handlers accumulate on it.
///
/// A `Request` lives for exactly one call into the dispatcher. Handlers read
/// the method, path, cookies and user from it, and write the outgoing
/// status, content type and extra headers back into it.
///
/// # Examples
///
/// ```
/// use tinyapp::{Method, Request};
///
/// let mut req = Request::new("GET", "/about").with_cookie_header("theme=dark");
/// assert_eq!(req.method(), &Method::Get);
/// assert_eq!(req.uri(), "/about");
/// assert_eq!(req.cookies().get("theme"), Some("dark"));
///
/// req.set_status("303 See Other");
/// req.add_raw_header("Location:  /home ");
/// assert_eq!(req.headers(), &[("Location".to_string(), "/home".to_string())]);
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    uri: String,
    cookies: Cookies,
    path_params: Vec<Option<String>>,
    user: Option<User>,
    status: String,
    content_type: String,
    headers: Vec<(String, String)>,
}

impl Request {
    /// Creates a request. The URI defaults to the path; there are no cookies.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: Method::parse(method),
            path: path.to_string(),
            uri: path.to_string(),
            cookies: Cookies::default(),
            path_params: Vec::new(),
            user: None,
            status: "200 OK".to_string(),
            content_type: HTML.to_string(),
            headers: Vec::new(),
        }
    }

    /// Sets the originating URI (path plus query string, as sent).
    pub fn with_uri(mut self, uri: &str) -> Self {
        self.uri = uri.to_string();
        self
    }

    /// Parses the raw `Cookie:` header. A malformed header means no cookies.
    pub fn with_cookie_header(mut self, header: &str) -> Self {
        self.cookies = Cookies::parse(header);
        self
    }

    /// Returns the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path used for routing.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the originating URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the parsed cookies.
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Returns capture group `index` (1-based) of the matched route pattern.
    pub fn path_param(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.path_params.get(i))
            .and_then(|p| p.as_deref())
    }

    pub(crate) fn set_path_params(&mut self, params: Vec<Option<String>>) {
        self.path_params = params;
    }

    /// Returns the authenticated user, if the session filter found one.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Attaches an authenticated user to the request.
    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Returns the response status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Sets the response status line, e.g. `"303 See Other"`.
    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Returns the response content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the response content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the extra response headers, in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Appends a response header.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Appends a response header given as one `"Name: value"` string.
    ///
    /// Splits at the first colon and trims the value. A string without a
    /// colon becomes a header with an empty value.
    pub fn add_raw_header(&mut self, header: &str) {
        let (name, value) = header.split_once(':').unwrap_or((header, ""));
        self.add_header(name, value.trim());
    }

    /// Returns a logger that tags every line with this request's method and URI.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(self.method.as_str(), &self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let req = Request::new("GET", "/");
        assert_eq!(req.status(), "200 OK");
        assert_eq!(req.content_type(), HTML);
        assert!(req.headers().is_empty());
        assert!(req.user().is_none());
        assert!(req.cookies().is_empty());
    }

    #[test]
    fn method_parse_is_case_sensitive() {
        assert_eq!(Method::parse("GET"), Method::Get);
        assert_eq!(Method::parse("POST"), Method::Post);
        assert_eq!(Method::parse("HEAD"), Method::Head);
        assert_eq!(Method::parse("get"), Method::Other("get".to_string()));
        assert_eq!(Method::parse("DELETE").to_string(), "DELETE");
    }

    #[test]
    fn uri_defaults_to_path() {
        let req = Request::new("GET", "/a");
        assert_eq!(req.uri(), "/a");
        let req = req.with_uri("/a?b=c");
        assert_eq!(req.path(), "/a");
        assert_eq!(req.uri(), "/a?b=c");
    }

    #[test]
    fn raw_header_splits_at_first_colon() {
        let mut req = Request::new("GET", "/");
        req.add_raw_header("Refresh: 5; url=http://example.com/");
        req.add_raw_header("X-Bare");
        assert_eq!(
            req.headers(),
            &[
                ("Refresh".to_string(), "5; url=http://example.com/".to_string()),
                ("X-Bare".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn headers_keep_insertion_order() {
        let mut req = Request::new("GET", "/");
        req.add_header("Set-Cookie", "a=1");
        req.add_header("Set-Cookie", "b=2");
        req.add_header("Cache-Control", "no-cache");
        let names: Vec<&str> = req.headers().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["Set-Cookie", "Set-Cookie", "Cache-Control"]);
    }

    #[test]
    fn path_params_are_one_based() {
        let mut req = Request::new("GET", "/arch/games");
        req.set_path_params(vec![Some("games".to_string()), None]);
        assert_eq!(req.path_param(0), None);
        assert_eq!(req.path_param(1), Some("games"));
        assert_eq!(req.path_param(2), None);
        assert_eq!(req.path_param(3), None);
    }

    #[test]
    fn malformed_cookie_header_is_not_fatal() {
        let req = Request::new("GET", "/").with_cookie_header("bad cookie");
        assert!(req.cookies().is_empty());
    }
}
