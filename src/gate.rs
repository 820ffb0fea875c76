use std::fmt;
use std::rc::Rc;

use crate::error::HandlerResult;
use crate::policy::{Filter, FindUser, RequireRole, RequireUser};
use crate::request::Request;
use crate::store::Store;

type Wrapped<'a> = Box<dyn Fn(&mut Request) -> HandlerResult + 'a>;

/// The ordered filters of one route.
///
/// Filters run in the order they were added; the first one added is the
/// outermost wrapper. Session resolution must be added before any access
/// filter that depends on it.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use tinyapp::{FilterChain, HandlerResult, MemoryStore, Request};
///
/// let store = Rc::new(MemoryStore::new());
/// let chain = FilterChain::new()
///     .find_user(store, "ifarch_")
///     .require_role(["rebuild"]);
///
/// assert_eq!(chain.labels(), ["find_user(ifarch_sessionid)", "require_role(rebuild)"]);
///
/// let mut req = Request::new("GET", "/rebuild");
/// let endpoint = |_req: &mut Request| -> HandlerResult { Ok("done".to_string()) };
/// let result = chain.run(&mut req, &endpoint);
/// assert!(result.is_err()); // nobody is logged in
/// ```
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn with(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Appends session resolution against `store`.
    pub fn find_user(self, store: Rc<dyn Store>, cookie_prefix: &str) -> Self {
        self.with(FindUser::new(store, cookie_prefix))
    }

    /// Appends a login requirement.
    pub fn require_user(self) -> Self {
        self.with(RequireUser)
    }

    /// Appends a requirement for any one of `roles`.
    pub fn require_role<I, R>(self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.with(RequireRole::any_of(roles))
    }

    /// Returns the number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns each filter's label, outermost first.
    pub fn labels(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.label()).collect()
    }

    /// Runs `endpoint` inside every filter.
    ///
    /// The chain is folded from the innermost filter outward, so each
    /// filter's `next` is the composition of everything after it.
    pub fn run(
        &self,
        req: &mut Request,
        endpoint: &dyn Fn(&mut Request) -> HandlerResult,
    ) -> HandlerResult {
        if self.filters.is_empty() {
            return endpoint(req);
        }
        let seed: Wrapped<'_> = Box::new(endpoint);
        let composed = self
            .filters
            .iter()
            .rev()
            .fold(seed, |next, filter| {
                let wrapped: Wrapped<'_> =
                    Box::new(move |req: &mut Request| filter.apply(req, &*next));
                wrapped
            });
        composed(req)
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.labels()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::{Failure, HttpFailure};
    use crate::policy::Next;
    use crate::session::User;
    use crate::store::MemoryStore;

    struct Trace {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Filter for Trace {
        fn apply(&self, req: &mut Request, next: Next<'_>) -> HandlerResult {
            self.log.borrow_mut().push(format!("enter {}", self.name));
            let result = next(req);
            self.log.borrow_mut().push(format!("leave {}", self.name));
            result
        }

        fn label(&self) -> String {
            self.name.to_string()
        }
    }

    struct Deny;

    impl Filter for Deny {
        fn apply(&self, _req: &mut Request, _next: Next<'_>) -> HandlerResult {
            Err(HttpFailure::new("403 Forbidden", "no").into())
        }

        fn label(&self) -> String {
            "deny".to_string()
        }
    }

    fn ok(_req: &mut Request) -> HandlerResult {
        Ok("body".to_string())
    }

    #[test]
    fn empty_chain_calls_endpoint() {
        let mut req = Request::new("GET", "/");
        assert_eq!(FilterChain::new().run(&mut req, &ok).unwrap(), "body");
    }

    #[test]
    fn filters_nest_in_declaration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = FilterChain::new()
            .with(Trace {
                name: "outer",
                log: log.clone(),
            })
            .with(Trace {
                name: "inner",
                log: log.clone(),
            });

        let mut req = Request::new("GET", "/");
        let endpoint_log = log.clone();
        let endpoint = move |_: &mut Request| -> HandlerResult {
            endpoint_log.borrow_mut().push("endpoint".to_string());
            Ok(String::new())
        };
        chain.run(&mut req, &endpoint).unwrap();

        assert_eq!(
            *log.borrow(),
            ["enter outer", "enter inner", "endpoint", "leave inner", "leave outer"]
        );
    }

    #[test]
    fn failing_filter_stops_the_chain() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let chain = FilterChain::new().with(Deny).with(Trace {
            name: "never",
            log: log.clone(),
        });

        let mut req = Request::new("GET", "/");
        let err = chain.run(&mut req, &ok).unwrap_err();
        assert!(matches!(err, Failure::Http(ref f) if f.status == "403 Forbidden"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn session_then_role() {
        let store: Rc<dyn Store> = Rc::new(
            MemoryStore::new()
                .with_user("zarf", "zarf@example.com", "admin")
                .with_session("tok", "zarf"),
        );
        let chain = FilterChain::new()
            .find_user(store, "")
            .require_user()
            .require_role(["incoming"]);
        assert_eq!(chain.len(), 3);

        let mut req = Request::new("GET", "/").with_cookie_header("sessionid=tok");
        let endpoint = |req: &mut Request| -> HandlerResult {
            Ok(req.user().map(User::name).unwrap_or_default().to_string())
        };
        assert_eq!(chain.run(&mut req, &endpoint).unwrap(), "zarf");
    }

    #[test]
    fn debug_lists_labels() {
        let chain = FilterChain::new().require_user();
        assert_eq!(format!("{:?}", chain), "[\"require_user\"]");
        assert!(!chain.is_empty());
    }
}
