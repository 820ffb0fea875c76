//! Routing, verb dispatch and the outermost error boundary.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use regex::Regex;

use crate::error::{Fault, FaultKind, HandlerResult, HttpFailure};
use crate::gate::FilterChain;
use crate::handler::Handler;
use crate::policy::Filter;
use crate::request::{Method, Request};
use crate::response::Response;
use crate::web::{Environ, ExtractRequest};

/// A route pattern that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid route pattern {pattern:?}")]
pub struct RouteError {
    /// The pattern as written
    pub pattern: String,
    /// Why it failed
    #[source]
    pub source: regex::Error,
}

/// One entry of the routing table: a path pattern, its handler, and the
/// filters that run before the handler.
///
/// The pattern must match the whole path: it is compiled as `^(?:pattern)$`,
/// so every alternative is anchored at both ends. A trailing `$` already in
/// the pattern is accepted. Capture groups become positional path
/// parameters.
pub struct Route {
    pattern: Regex,
    source: String,
    handler: Box<dyn Handler>,
    filters: FilterChain,
}

impl Route {
    /// Compiles `pattern` and binds it to `handler`.
    pub fn new(pattern: &str, handler: impl Handler + 'static) -> Result<Self, RouteError> {
        let anchored = format!("^(?:{})$", strip_end_anchor(pattern));
        let compiled = Regex::new(&anchored).map_err(|source| RouteError {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            source: pattern.to_string(),
            handler: Box::new(handler),
            filters: FilterChain::new(),
        })
    }

    /// Appends one filter.
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters = self.filters.with(filter);
        self
    }

    /// Replaces the filter chain.
    pub fn filters(mut self, chain: FilterChain) -> Self {
        self.filters = chain;
        self
    }

    /// Returns the pattern as written.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// Returns the capture groups if `path` matches, or `None`.
    pub fn captures(&self, path: &str) -> Option<Vec<Option<String>>> {
        let caps = self.pattern.captures(path)?;
        Some(
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }
}

/// Drops one trailing unescaped `$`.
fn strip_end_anchor(pattern: &str) -> &str {
    let Some(body) = pattern.strip_suffix('$') else {
        return pattern;
    };
    let escapes = body.bytes().rev().take_while(|&b| b == b'\\').count();
    if escapes % 2 == 0 {
        body
    } else {
        pattern
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.source)
            .field("filters", &self.filters)
            .finish_non_exhaustive()
    }
}

/// The application: an ordered routing table and the dispatcher around it.
///
/// # Examples
///
/// ```
/// use tinyapp::{App, Handler, HandlerResult, Request, Route};
/// use tinyapp::web::Environ;
///
/// struct Item;
///
/// impl Handler for Item {
///     fn get(&self, req: &mut Request) -> HandlerResult {
///         Ok(format!("item {}", req.path_param(1).unwrap_or("?")))
///     }
/// }
///
/// let app = App::new(vec![Route::new(r"/item/(\d+)", Item).unwrap()]);
///
/// let resp = app.handle(&Environ::synthetic_get("/item/42"));
/// assert_eq!(resp.status(), "200 OK");
/// assert_eq!(resp.body_text(), "item 42");
///
/// let resp = app.handle(&Environ::synthetic_get("/item/42/extra"));
/// assert_eq!(resp.status(), "404 Not Found");
/// ```
#[derive(Debug, Default)]
pub struct App {
    routes: Vec<Route>,
}

impl App {
    /// Creates an app. Routes are tried in order; the first match wins.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Appends a route after the existing ones.
    pub fn route(mut self, route: Route) -> Self {
        self.routes.push(route);
        self
    }

    /// Returns the routes in match order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Routes `req` and runs the matched handler inside its filters.
    ///
    /// Declared failures and faults are returned, not enveloped. See
    /// [`App::handle`] for the full request cycle.
    pub fn process(&self, req: &mut Request) -> HandlerResult {
        let Some((route, params)) = self
            .routes
            .iter()
            .find_map(|route| route.captures(req.path()).map(|params| (route, params)))
        else {
            req.log().debug(format_args!("no route matched"));
            return Err(HttpFailure::not_found(req.uri()).into());
        };
        req.log()
            .debug(format_args!("matched route {}", route.pattern()));
        req.set_path_params(params);

        let handler = route.handler.as_ref();
        let get = |req: &mut Request| handler.get(req);
        let post = |req: &mut Request| handler.post(req);
        let head = |req: &mut Request| handler.head(req);
        let endpoint: &dyn Fn(&mut Request) -> HandlerResult = match req.method() {
            Method::Get => &get,
            Method::Post => &post,
            Method::Head => &head,
            Method::Other(method) => {
                return Err(HttpFailure::method_not_allowed(method, req.uri()).into());
            }
        };
        route.filters.run(req, endpoint)
    }

    /// Runs one full request cycle and returns the envelope.
    ///
    /// Never fails: declared failures become their plain-text envelope,
    /// and faults (panics included) become `500 Internal Error` with the
    /// diagnostic trace in the body.
    pub fn handle(&self, environ: &Environ) -> Response {
        install_panic_hook();
        PANIC_SITE.with(|cell| cell.set(None));
        let mut req = environ.extract_request();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(&mut req)))
            .unwrap_or_else(|payload| Err(panic_fault(&*payload).into()));
        Response::assemble(&req, outcome)
    }

    /// Transport entry point: hands status and headers to `start_response`,
    /// then returns the body.
    pub fn serve<F>(&self, environ: &Environ, start_response: F) -> Vec<u8>
    where
        F: FnOnce(&str, &[(String, String)]),
    {
        let resp = self.handle(environ);
        start_response(resp.status(), &resp.header_list());
        resp.into_body()
    }

    /// Runs a synthetic GET of `uri` and writes the status line, the
    /// headers, a blank line and the body to `out`.
    pub fn test_dump(&self, uri: &str, out: &mut impl Write) -> io::Result<()> {
        let mut head = String::new();
        let body = self.serve(&Environ::synthetic_get(uri), |status, headers| {
            head.push_str(status);
            head.push('\n');
            for (name, value) in headers {
                head.push_str(&format!("{}: {}\n", name, value));
            }
        });
        out.write_all(head.as_bytes())?;
        out.write_all(b"\n")?;
        out.write_all(&body)?;
        out.flush()
    }
}

thread_local! {
    static PANIC_SITE: Cell<Option<(String, Backtrace)>> = const { Cell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chains a hook in front of the current one that records where the
/// panic happened, for [`panic_fault`] to pick up after unwinding.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if let Some(location) = info.location() {
                let site = (location.to_string(), Backtrace::force_capture());
                let _ = PANIC_SITE.try_with(|cell| cell.set(Some(site)));
            }
            previous(info);
        }));
    });
}

fn panic_fault(payload: &(dyn Any + Send)) -> Fault {
    let message = panic_message(payload);
    // Absent if another hook replaced ours after installation.
    match PANIC_SITE.with(Cell::take) {
        Some((location, backtrace)) => Fault::with_backtrace(
            FaultKind::Panic {
                message,
                location: Some(location),
            },
            backtrace,
        ),
        None => Fault::new(FaultKind::Panic {
            message,
            location: None,
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
