//! Middleware layer.
//!
//! A middleware is an `async fn(Request) -> Result<Request, Error>`: it may
//! rewrite the request on its way to the handler (the JSON body parser
//! lives here) or veto it by raising an [`Error`]. There is no other
//! short-circuit. Global middleware run for every request, before the route
//! is even resolved; route-scoped middleware run after the match, before
//! their handler. Both scopes execute sequentially in registration order.
//!
//! Type erasure mirrors [`crate::handler`]: a sealed trait with a blanket
//! impl over plain async functions, stored as `Arc<dyn …>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::error::Error;
use crate::request::Request;

// ── Erasure ───────────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to the middleware outcome.
pub(crate) type MiddlewareFuture =
    Pin<Box<dyn Future<Output = Result<Request, Error>> + Send + 'static>>;

/// Internal dispatch interface; see [`crate::handler::ErasedHandler`] for
/// why it is `#[doc(hidden)] pub`.
#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request) -> MiddlewareFuture;
}

/// A heap-allocated, type-erased middleware shared across requests.
#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware function:
///
/// ```text
/// async fn name(req: Request) -> Result<Request, Error>
/// ```
///
/// Sealed; only the blanket impl below satisfies it.
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Request, Error>> + Send + 'static,
{
}

impl<F, Fut> Middleware for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Request, Error>> + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Request, Error>> + Send + 'static,
{
    fn call(&self, req: Request) -> MiddlewareFuture {
        Box::pin((self.0)(req))
    }
}

/// Boxes a middleware for the list-taking registration methods:
///
/// ```rust,no_run
/// use switchboard::{middleware, Method, Router};
/// # async fn guard(req: switchboard::Request) -> Result<switchboard::Request, switchboard::Error> { Ok(req) }
/// # async fn create(_req: switchboard::Request) -> Result<switchboard::Response, switchboard::Error> { todo!() }
///
/// Router::new().on_with(
///     Method::Post,
///     "/products",
///     create,
///     vec![middleware::boxed(guard)],
/// );
/// ```
pub fn boxed(mw: impl Middleware) -> BoxedMiddleware {
    mw.into_boxed_middleware()
}

// ── Built-ins ─────────────────────────────────────────────────────────────────

/// Parses a JSON request body into the request's body slot.
///
/// Gated on an exact `content-type` match: `application/json` or
/// `application/json;charset=utf-8`. Anything else leaves the body slot at
/// `{}` without touching the transport. An empty payload also parses to
/// `{}`; malformed JSON fails the request.
///
/// The request normalizer never reads the body, so this must be registered
/// explicitly (normally as global middleware) for handlers to see one.
pub async fn json_body(mut req: Request) -> Result<Request, Error> {
    if !is_json(req.header("content-type")) {
        return Ok(req);
    }
    let bytes = req.read_body().await?;
    if bytes.is_empty() {
        req.set_body(Value::Object(serde_json::Map::new()));
        return Ok(req);
    }
    let parsed = serde_json::from_slice(&bytes)?;
    req.set_body(parsed);
    Ok(req)
}

fn is_json(content_type: Option<&str>) -> bool {
    matches!(
        content_type,
        Some("application/json" | "application/json;charset=utf-8")
    )
}

/// Logs the request line at `info` level.
pub async fn log(req: Request) -> Result<Request, Error> {
    info!(method = %req.method(), path = req.pathname(), "request");
    Ok(req)
}
