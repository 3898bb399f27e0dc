//! Route table and matcher.
//!
//! Patterns are plain paths where a segment starting with `:` names a
//! capture: `/products/:slug`. Matching is two-phase — an exact string
//! lookup first (static routes always beat parameterized ones, O(1)), then
//! a scan of the capture-bearing patterns in registration order. The first
//! structurally matching candidate wins; ties between patterns with the
//! same literal layout are resolved by registration order, never rejected.
//!
//! The table is built during a distinct registration phase and handed to
//! the server immutably. Nothing mutates it per request, so concurrent
//! resolutions share it without locks.

use std::collections::HashMap;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware};

/// The application router: routes keyed by method, plus the global
/// middleware chain. Build it once at startup; pass it to
/// [`Server::serve`](crate::Server::serve). Registrations chain:
///
/// ```rust,no_run
/// use switchboard::{middleware, Request, Response, Router, Error};
/// # async fn show(_: Request) -> Result<Response, Error> { todo!() }
/// # async fn create(_: Request) -> Result<Response, Error> { todo!() }
///
/// let app = Router::new()
///     .with(middleware::log)
///     .with(middleware::json_body)
///     .get("/products/:slug", show)
///     .post("/products", create);
/// ```
pub struct Router {
    routes: HashMap<Method, MethodTable>,
    middleware: Vec<BoxedMiddleware>,
}

/// Per-method storage: entries in registration order, plus an index from
/// the exact pattern string to its slot for the fast path.
#[derive(Default)]
struct MethodTable {
    index: HashMap<String, usize>,
    entries: Vec<Route>,
}

/// A registered route: parsed pattern, handler, route-scoped middleware.
pub(crate) struct Route {
    pub(crate) pattern: Pattern,
    pub(crate) handler: BoxedHandler,
    pub(crate) middleware: Vec<BoxedMiddleware>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Appends a global middleware. Global middleware run for every
    /// request — before route resolution, so they also run for requests
    /// that end up unmatched — in the order they were registered.
    pub fn with(mut self, mw: impl Middleware) -> Self {
        self.middleware.push(mw.into_boxed_middleware());
        self
    }

    /// Registers a handler for a method + pattern pair.
    ///
    /// Registering the same (method, pattern) again silently replaces the
    /// earlier route, keeping its position in registration order.
    pub fn on(self, method: Method, pattern: &str, handler: impl Handler) -> Self {
        self.add(method, pattern, handler, Vec::new())
    }

    /// Like [`on`](Router::on), with route-scoped middleware that run after
    /// the route matches and before its handler, in list order.
    pub fn on_with(
        self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
        middleware: Vec<BoxedMiddleware>,
    ) -> Self {
        self.add(method, pattern, handler, middleware)
    }

    pub fn get(self, pattern: &str, handler: impl Handler) -> Self {
        self.add(Method::Get, pattern, handler, Vec::new())
    }

    pub fn post(self, pattern: &str, handler: impl Handler) -> Self {
        self.add(Method::Post, pattern, handler, Vec::new())
    }

    pub fn put(self, pattern: &str, handler: impl Handler) -> Self {
        self.add(Method::Put, pattern, handler, Vec::new())
    }

    pub fn delete(self, pattern: &str, handler: impl Handler) -> Self {
        self.add(Method::Delete, pattern, handler, Vec::new())
    }

    pub fn head(self, pattern: &str, handler: impl Handler) -> Self {
        self.add(Method::Head, pattern, handler, Vec::new())
    }

    fn add(
        mut self,
        method: Method,
        pattern: &str,
        handler: impl Handler,
        middleware: Vec<BoxedMiddleware>,
    ) -> Self {
        let route = Route {
            pattern: Pattern::parse(pattern),
            handler: handler.into_boxed_handler(),
            middleware,
        };
        let table = self.routes.entry(method).or_default();
        match table.index.get(route.pattern.raw()) {
            Some(&slot) => table.entries[slot] = route,
            None => {
                table.index.insert(route.pattern.raw().to_owned(), table.entries.len());
                table.entries.push(route);
            }
        }
        self
    }

    /// Resolves a request to a route and its captured parameters.
    ///
    /// Methods outside the dispatchable set resolve to `None` like any
    /// unmatched path.
    pub(crate) fn resolve(
        &self,
        method: &http::Method,
        pathname: &str,
    ) -> Option<(&Route, HashMap<String, String>)> {
        let table = self.routes.get(&Method::from_http(method)?)?;

        if let Some(&slot) = table.index.get(pathname) {
            return Some((&table.entries[slot], HashMap::new()));
        }

        let parts: Vec<&str> = segments(pathname).collect();
        table
            .entries
            .iter()
            .filter(|route| route.pattern.has_captures())
            .find_map(|route| route.pattern.bind(&parts).map(|params| (route, params)))
    }

    pub(crate) fn global(&self) -> &[BoxedMiddleware] {
        &self.middleware
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

// ── Patterns ──────────────────────────────────────────────────────────────────

/// A parsed route pattern.
pub(crate) struct Pattern {
    raw: String,
    parts: Vec<Segment>,
}

enum Segment {
    Literal(String),
    Capture(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        let parts = segments(raw)
            .map(|part| match part.strip_prefix(':') {
                Some(name) => Segment::Capture(name.to_owned()),
                None => Segment::Literal(part.to_owned()),
            })
            .collect();
        Self { raw: raw.to_owned(), parts }
    }

    pub(crate) fn raw(&self) -> &str {
        &self.raw
    }

    fn has_captures(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part, Segment::Capture(_)))
    }

    /// Binds the request's path segments against this pattern.
    ///
    /// A candidate must have the same segment count; literals must match
    /// exactly; a capture accepts any segment unconditionally — no
    /// decoding, validation, or coercion — and binds it verbatim.
    fn bind(&self, parts: &[&str]) -> Option<HashMap<String, String>> {
        if parts.len() != self.parts.len() {
            return None;
        }
        let mut params = HashMap::new();
        for (segment, &value) in self.parts.iter().zip(parts) {
            match segment {
                Segment::Literal(literal) if literal == value => {}
                Segment::Literal(_) => return None,
                Segment::Capture(name) => {
                    params.insert(name.clone(), value.to_owned());
                }
            }
        }
        Some(params)
    }
}

/// Path segments with empty ones dropped, so leading, trailing, and
/// duplicate slashes never produce a segment.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::request::Request;
    use crate::response::Response;
    use http::StatusCode;

    async fn ok(_req: Request) -> Result<Response, Error> {
        Ok(Response::status(StatusCode::OK))
    }

    fn matched<'r>(router: &'r Router, method: http::Method, path: &str) -> &'r str {
        let (route, _) = router.resolve(&method, path).expect("expected a match");
        route.pattern.raw()
    }

    #[test]
    fn exact_match_returns_empty_params() {
        let router = Router::new().get("/products", ok);
        let (route, params) = router.resolve(&http::Method::GET, "/products").unwrap();
        assert_eq!(route.pattern.raw(), "/products");
        assert!(params.is_empty());
    }

    #[test]
    fn binds_named_captures() {
        let router = Router::new().get("/a/:x/b", ok);
        let (_, params) = router.resolve(&http::Method::GET, "/a/42/b").unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params["x"], "42");
    }

    #[test]
    fn binds_multiple_captures() {
        let router = Router::new().get("/course/:course/lesson/:lesson", ok);
        let (_, params) = router
            .resolve(&http::Method::GET, "/course/rust/lesson/3")
            .unwrap();
        assert_eq!(params["course"], "rust");
        assert_eq!(params["lesson"], "3");
    }

    #[test]
    fn exact_entry_beats_parameterized_regardless_of_order() {
        let router = Router::new().get("/a/:x", ok).get("/a/fixed", ok);
        assert_eq!(matched(&router, http::Method::GET, "/a/fixed"), "/a/fixed");
        assert_eq!(matched(&router, http::Method::GET, "/a/other"), "/a/:x");
    }

    #[test]
    fn first_registered_candidate_wins() {
        let router = Router::new().get("/a/:x", ok).get("/a/:y", ok);
        let (route, params) = router.resolve(&http::Method::GET, "/a/42").unwrap();
        assert_eq!(route.pattern.raw(), "/a/:x");
        assert_eq!(params["x"], "42");
    }

    #[test]
    fn unregistered_path_is_not_found() {
        let router = Router::new().get("/products/:slug", ok);
        assert!(router.resolve(&http::Method::GET, "/orders/1").is_none());
    }

    #[test]
    fn methods_are_independent_tables() {
        let router = Router::new().get("/a", ok).post("/a/:id", ok);
        assert_eq!(matched(&router, http::Method::GET, "/a"), "/a");
        assert!(router.resolve(&http::Method::GET, "/a/1").is_none());
        assert_eq!(matched(&router, http::Method::POST, "/a/1"), "/a/:id");
    }

    #[test]
    fn undispatchable_methods_never_match() {
        let router = Router::new().get("/a", ok);
        assert!(router.resolve(&http::Method::PATCH, "/a").is_none());
        assert!(router.resolve(&http::Method::OPTIONS, "/a").is_none());
    }

    #[test]
    fn extra_slashes_are_normalized_for_candidates() {
        let router = Router::new().get("/a/:x", ok);
        let (_, params) = router.resolve(&http::Method::GET, "/a/42/").unwrap();
        assert_eq!(params["x"], "42");
        let (_, params) = router.resolve(&http::Method::GET, "//a//42").unwrap();
        assert_eq!(params["x"], "42");
    }

    #[test]
    fn static_routes_require_the_exact_string() {
        // Capture-less patterns are only reachable through the exact fast
        // path; "/a/" is a different string from the registered "/a".
        let router = Router::new().get("/a", ok);
        assert!(router.resolve(&http::Method::GET, "/a/").is_none());
    }

    #[test]
    fn captures_accept_marker_lookalikes() {
        let router = Router::new().get("/a/:x", ok);
        let (_, params) = router.resolve(&http::Method::GET, "/a/:y").unwrap();
        assert_eq!(params["x"], ":y");
    }

    #[test]
    fn captures_may_lead_the_pattern() {
        let router = Router::new().get("/:page", ok);
        let (_, params) = router.resolve(&http::Method::GET, "/about").unwrap();
        assert_eq!(params["page"], "about");
    }

    #[test]
    fn segment_count_must_match() {
        let router = Router::new().get("/a/:x", ok);
        assert!(router.resolve(&http::Method::GET, "/a").is_none());
        assert!(router.resolve(&http::Method::GET, "/a/1/2").is_none());
    }

    #[tokio::test]
    async fn reregistration_overwrites_in_place() {
        async fn first(_req: Request) -> Result<Response, Error> {
            Ok(Response::text("first"))
        }
        async fn second(_req: Request) -> Result<Response, Error> {
            Ok(Response::text("second"))
        }
        // `/p/:id` is overwritten after `/p/:other` was added; it must keep
        // its original slot, so it still wins the candidate scan.
        let router = Router::new()
            .get("/p/:id", first)
            .get("/p/:other", ok)
            .get("/p/:id", second);

        let (route, params) = router.resolve(&http::Method::GET, "/p/9").unwrap();
        assert_eq!(route.pattern.raw(), "/p/:id");
        assert_eq!(params["id"], "9");

        let req = Request::test(http::Method::GET, "/p/9");
        let res = route.handler.call(req).await.unwrap();
        assert_eq!(res.body, b"second");
    }
}
