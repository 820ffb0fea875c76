use crate::error::{Fault, HandlerResult};
use crate::request::Request;

/// A request handler attached to one route pattern.
///
/// Implement only the verbs the route supports. An unimplemented verb
/// answers with [`FaultKind::NotImplemented`](crate::FaultKind::NotImplemented), which reaches the client as a
/// 500 but is distinguishable from 404/405 in the logs.
///
/// `head` runs `get` for its side effects and discards the body.
///
/// # Examples
///
/// ```
/// use tinyapp::{HandlerResult, Handler, Request};
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn get(&self, req: &mut Request) -> HandlerResult {
///         req.set_content_type("text/plain");
///         Ok("hello".to_string())
///     }
/// }
///
/// let mut req = Request::new("HEAD", "/");
/// assert_eq!(Hello.head(&mut req).unwrap(), "");
/// assert!(Hello.post(&mut req).is_err());
/// ```
pub trait Handler {
    /// Handles a GET.
    fn get(&self, _req: &mut Request) -> HandlerResult {
        Err(Fault::not_implemented("GET").into())
    }

    /// Handles a POST.
    fn post(&self, _req: &mut Request) -> HandlerResult {
        Err(Fault::not_implemented("POST").into())
    }

    /// Handles a HEAD.
    fn head(&self, req: &mut Request) -> HandlerResult {
        self.get(req)?;
        Ok(String::new())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::{Failure, FaultKind};

    struct PostOnly;

    impl Handler for PostOnly {
        fn post(&self, _req: &mut Request) -> HandlerResult {
            Ok("posted".to_string())
        }
    }

    struct Counting {
        calls: Cell<usize>,
    }

    impl Handler for Counting {
        fn get(&self, req: &mut Request) -> HandlerResult {
            self.calls.set(self.calls.get() + 1);
            req.add_header("X-Rendered", "yes");
            Ok("X".to_string())
        }
    }

    #[test]
    fn missing_verbs_are_not_implemented() {
        let mut req = Request::new("GET", "/");
        let err = PostOnly.get(&mut req).unwrap_err();
        assert!(matches!(
            err,
            Failure::Fault(ref f) if matches!(f.kind(), FaultKind::NotImplemented("GET"))
        ));
        assert_eq!(PostOnly.post(&mut req).unwrap(), "posted");
    }

    #[test]
    fn head_runs_get_and_drops_body() {
        let handler = Counting {
            calls: Cell::new(0),
        };
        let mut req = Request::new("HEAD", "/");
        assert_eq!(handler.head(&mut req).unwrap(), "");
        assert_eq!(handler.calls.get(), 1);
        assert_eq!(req.headers().len(), 1);
    }

    #[test]
    fn head_propagates_get_failure() {
        let mut req = Request::new("HEAD", "/");
        assert!(PostOnly.head(&mut req).is_err());
    }
}
