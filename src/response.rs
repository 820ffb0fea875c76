//! The response envelope.

use crate::error::{Failure, HttpFailure, INTERNAL_ERROR};
use crate::request::Request;

/// Content type of every failure body.
pub const PLAINTEXT: &str = "text/plain";

/// Default content type of a successful response.
pub const HTML: &str = "text/html; charset=utf-8";

/// What a transport sends back for one request: status line, content type,
/// extra headers and body bytes.
///
/// Every request processed by [`App`](crate::App) produces exactly one
/// `Response`, whether the handler succeeded, raised a declared
/// [`HttpFailure`], or faulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: String,
    content_type: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// Builds the envelope for the outcome of processing `req`.
    ///
    /// Headers accumulated on the request are kept on every path. Faults
    /// are logged at error level with their full trace, and the same trace
    /// is returned in the body.
    pub fn assemble(req: &Request, outcome: Result<String, Failure>) -> Self {
        match outcome {
            Ok(body) => Self {
                status: req.status().to_string(),
                content_type: req.content_type().to_string(),
                headers: req.headers().to_vec(),
                body: body.into_bytes(),
            },
            Err(Failure::Http(failure)) => {
                req.log().debug(format_args!("declared failure: {}", failure));
                Self::declared(req, &failure)
            }
            Err(Failure::Fault(fault)) => {
                let trace = fault.diagnostic_trace();
                req.log().fault(&trace);
                let text = format!("{}\n\n{}", INTERNAL_ERROR, trace);
                Self::plain(INTERNAL_ERROR, text, req.headers().to_vec())
            }
        }
    }

    fn declared(req: &Request, failure: &HttpFailure) -> Self {
        Self::plain(&failure.status, failure.body(), req.headers().to_vec())
    }

    fn plain(status: &str, text: String, headers: Vec<(String, String)>) -> Self {
        Self {
            status: status.to_string(),
            content_type: PLAINTEXT.to_string(),
            headers,
            body: text.into_bytes(),
        }
    }

    /// Returns the status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Returns the content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns the extra headers accumulated by the handler.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Consumes the response, returning the body bytes.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// The full header list for the transport: `Content-Type`,
    /// `Content-Length`, then the extra headers in insertion order.
    pub fn header_list(&self) -> Vec<(String, String)> {
        let mut list = Vec::with_capacity(self.headers.len() + 2);
        list.push(("Content-Type".to_string(), self.content_type.clone()));
        list.push(("Content-Length".to_string(), self.body.len().to_string()));
        list.extend(self.headers.iter().cloned());
        list
    }
}
