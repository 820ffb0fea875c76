use std::backtrace::Backtrace;
use std::error::Error as _;
use std::fmt;
use std::fmt::Write as _;

use crate::store::StoreError;

/// Status line used for every undeclared failure.
pub const INTERNAL_ERROR: &str = "500 Internal Error";

/// Result of a handler operation: the response body, or the reason there is none.
pub type HandlerResult = Result<String, Failure>;

/// An expected, user-facing HTTP failure.
///
/// Raised deliberately by the router, the dispatcher and the access filters
/// to abort normal processing. The outermost boundary turns it into a
/// plain-text envelope of the form `"<status>\n\n<message>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// The kind of failure
    pub kind: FailureKind,
    /// Full status line, e.g. `"404 Not Found"`
    pub status: String,
    /// Human-readable explanation
    pub message: String,
}

impl HttpFailure {
    /// Creates a failure with an arbitrary status line.
    pub fn new(status: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Other,
            status: status.into(),
            message: message.into(),
        }
    }

    /// No route pattern matched the request path.
    pub fn not_found(uri: &str) -> Self {
        Self {
            kind: FailureKind::NotFound,
            status: "404 Not Found".to_string(),
            message: format!("Not found: {}", uri),
        }
    }

    /// The verb is not one the dispatcher knows how to route.
    pub fn method_not_allowed(method: &str, uri: &str) -> Self {
        Self {
            kind: FailureKind::MethodNotAllowed,
            status: "405 Method Not Allowed".to_string(),
            message: format!("Not allowed: {}, {}", method, uri),
        }
    }

    /// The route requires a logged-in user and there is none.
    pub fn not_logged_in() -> Self {
        Self {
            kind: FailureKind::Unauthenticated,
            status: "401 Unauthorized".to_string(),
            message: "Not logged in".to_string(),
        }
    }

    /// The user is logged in but holds none of the required roles.
    pub fn not_authorized() -> Self {
        Self {
            kind: FailureKind::Unauthorized,
            status: "401 Unauthorized".to_string(),
            message: "Not authorized for this page".to_string(),
        }
    }

    /// Renders the plain-text response body.
    pub fn body(&self) -> String {
        format!("{}\n\n{}", self.status, self.message)
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpFailure {}

/// The kind of declared failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No route matched (404)
    NotFound,
    /// Verb not routable (405)
    MethodNotAllowed,
    /// Protected route, no user (401)
    Unauthenticated,
    /// Protected route, user lacks every acceptable role (401)
    Unauthorized,
    /// Raised by a handler with a status of its own choosing
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::MethodNotAllowed => write!(f, "method_not_allowed"),
            FailureKind::Unauthenticated => write!(f, "unauthenticated"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::Other => write!(f, "other"),
        }
    }
}

/// An undeclared failure: anything that went wrong without being raised
/// on purpose as an [`HttpFailure`].
///
/// Every fault reaches the client as `500 Internal Error` and is logged at
/// error level with its full diagnostic trace. The backtrace is captured
/// when the fault is built, so the trace names the code that raised it.
#[derive(Debug)]
pub struct Fault {
    kind: FaultKind,
    backtrace: Backtrace,
}

/// What kind of fault occurred.
#[derive(Debug, thiserror::Error)]
pub enum FaultKind {
    /// The matched handler does not implement the requested verb
    #[error("{0} not implemented")]
    NotImplemented(&'static str),
    /// The session/user store failed
    #[error("store failure")]
    Store(#[source] StoreError),
    /// The template renderer failed
    #[error("render failure")]
    Render(#[source] tera::Error),
    /// An I/O operation failed
    #[error("I/O failure")]
    Io(#[source] std::io::Error),
    /// The handler panicked
    #[error("handler panicked{}: {message}", at_location(.location))]
    Panic {
        /// The panic payload, if it was a string
        message: String,
        /// `file:line:column` of the panic, when known
        location: Option<String>,
    },
    /// Any other handler-specific fault
    #[error("{0}")]
    Other(String),
}

fn at_location(location: &Option<String>) -> String {
    location
        .as_deref()
        .map(|l| format!(" at {}", l))
        .unwrap_or_default()
}

impl Fault {
    /// Builds a fault and captures the current backtrace.
    pub fn new(kind: FaultKind) -> Self {
        Self::with_backtrace(kind, Backtrace::force_capture())
    }

    /// Builds a fault with a backtrace captured elsewhere.
    pub fn with_backtrace(kind: FaultKind, backtrace: Backtrace) -> Self {
        Self { kind, backtrace }
    }

    /// A handler-specific fault with a free-form message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FaultKind::Other(message.into()))
    }

    /// The handler has no implementation for `verb`.
    pub fn not_implemented(verb: &'static str) -> Self {
        Self::new(FaultKind::NotImplemented(verb))
    }

    /// Returns what went wrong.
    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }

    /// Returns the backtrace taken where the fault was raised.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Formats the fault, every error in its source chain, and the
    /// backtrace.
    pub fn diagnostic_trace(&self) -> String {
        let mut trace = format!("{}\n", self);
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = writeln!(trace, "caused by: {}", cause);
            source = cause.source();
        }
        let _ = write!(trace, "\nbacktrace:\n{}", self.backtrace);
        trace
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

impl From<FaultKind> for Fault {
    fn from(kind: FaultKind) -> Self {
        Self::new(kind)
    }
}

impl From<StoreError> for Fault {
    fn from(e: StoreError) -> Self {
        Self::new(FaultKind::Store(e))
    }
}

impl From<tera::Error> for Fault {
    fn from(e: tera::Error) -> Self {
        Self::new(FaultKind::Render(e))
    }
}

impl From<std::io::Error> for Fault {
    fn from(e: std::io::Error) -> Self {
        Self::new(FaultKind::Io(e))
    }
}

/// Why a handler operation produced no body.
#[derive(Debug, thiserror::Error)]
pub enum Failure {
    /// A declared, user-facing failure
    #[error(transparent)]
    Http(#[from] HttpFailure),
    /// An undeclared fault
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl From<StoreError> for Failure {
    fn from(e: StoreError) -> Self {
        Failure::Fault(e.into())
    }
}

impl From<tera::Error> for Failure {
    fn from(e: tera::Error) -> Self {
        Failure::Fault(e.into())
    }
}

impl From<std::io::Error> for Failure {
    fn from(e: std::io::Error) -> Self {
        Failure::Fault(e.into())
    }
}
