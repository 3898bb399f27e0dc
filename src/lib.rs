//! # switchboard
//!
//! A minimal HTTP request-dispatch framework. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! switchboard takes a raw inbound request, resolves it against a route
//! table, runs your middleware in order, runs your handler, and turns
//! whatever came out — a response or a failure — into exactly one wire
//! response. What it dispatches *to* is your business: handlers are plain
//! async functions, and the framework neither knows nor cares whether they
//! talk to a database, a cache, or nothing at all.
//!
//! What switchboard does:
//!
//! - **Routing** — static paths resolve in O(1); `:name` segments capture
//!   path parameters, first registered pattern wins
//! - **Middleware** — one global chain for every request, one scoped chain
//!   per route, run sequentially in registration order
//! - **Failure translation** — raised [`Error`]s become
//!   `application/problem+json` bodies at a single boundary; anything
//!   unexpected is logged and leaves as a bare 500
//! - **Serving** — tokio + hyper, HTTP/1.1 and HTTP/2, graceful shutdown on
//!   SIGTERM / Ctrl-C
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use switchboard::{middleware, Error, Request, Response, Router, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .with(middleware::log)
//!         .with(middleware::json_body)
//!         .get("/products/:slug", get_product)
//!         .post("/products", create_product);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_product(req: Request) -> Result<Response, Error> {
//!     let slug = req.param("slug").unwrap_or("unknown");
//!     Ok(Response::json(&serde_json::json!({ "slug": slug })))
//! }
//!
//! async fn create_product(req: Request) -> Result<Response, Error> {
//!     let name = req.body()["name"]
//!         .as_str()
//!         .ok_or_else(|| Error::new(StatusCode::BAD_REQUEST, "missing field `name`"))?;
//!     Ok(Response::json(&serde_json::json!({ "created": name }))
//!         .with_status(StatusCode::CREATED))
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use router::Router;
pub use server::Server;

// Re-exported so handlers can name status codes without adding a direct
// dependency on the `http` crate.
pub use http::StatusCode;
