use std::fmt;

use tracing_subscriber::EnvFilter;

/// A logger bound to one request.
///
/// Obtained from [`Request::log`](crate::Request::log). Every line carries
/// the request's method and URI as structured fields.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    method: &'a str,
    uri: &'a str,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(method: &'a str, uri: &'a str) -> Self {
        Self { method, uri }
    }

    /// Returns the URI this logger is bound to.
    pub fn uri(&self) -> &str {
        self.uri
    }

    /// Logs an info-level message.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(method = %self.method, uri = %self.uri, "{}", args);
    }

    /// Logs an undeclared fault with its diagnostic trace as a field.
    pub fn fault(&self, trace: &str) {
        tracing::error!(method = %self.method, uri = %self.uri, trace = %trace, "internal error");
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(method = %self.method, uri = %self.uri, "{}", args);
    }
}

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_level`. Does nothing if a global
/// subscriber is already set.
pub fn init_subscriber(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
