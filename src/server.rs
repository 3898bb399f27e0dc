//! HTTP server, the dispatch engine, and graceful shutdown.
//!
//! The server owns the outer lifecycle: accept connections, hand each one
//! to a task, drain them all on SIGTERM/Ctrl-C. The dispatch engine owns
//! the per-request lifecycle: normalize, run global middleware, resolve,
//! bind params, run route middleware, run the handler, and translate any
//! failure into exactly one structured error response at a single boundary.

use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// The router is frozen here: it moves behind an `Arc` and is only read
    /// from this point on. Returns after a full graceful shutdown — a
    /// SIGTERM or Ctrl-C stops the accept loop, then every in-flight
    /// connection runs to completion.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        info!(addr = %self.addr, "listening");

        // Every connection task lands in the JoinSet so shutdown can wait
        // for all of them.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` checks arms top-to-bottom: a pending shutdown
                // wins over queued connections.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(conn) => conn,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // One closure call per request on the connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move {
                                let request = Request::from_hyper(req);
                                Ok::<_, std::convert::Infallible>(
                                    handle(&router, request).await.into_hyper(),
                                )
                            }
                        });

                        // Serves HTTP/1.1 or HTTP/2, whichever the client
                        // negotiated.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the set stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("stopped");
        Ok(())
    }
}

// ── Dispatch engine ───────────────────────────────────────────────────────────

/// Runs one request through the pipeline and always produces a response.
///
/// This is the only place error responses are written, and the service
/// error type upstream is `Infallible` — hyper never sees a failure.
pub(crate) async fn handle(router: &Router, req: Request) -> Response {
    run(router, req).await.unwrap_or_else(fail)
}

/// The pipeline: global middleware, resolution, param binding, route
/// middleware, handler. Sequential, awaited step by step; the first `Err`
/// is terminal for the request. Global middleware run before the route is
/// looked up, so a veto there means no handler-specific code runs at all.
async fn run(router: &Router, mut req: Request) -> Result<Response, Error> {
    for mw in router.global() {
        req = mw.call(req).await?;
    }

    let (route, params) = router
        .resolve(&req.method, &req.pathname)
        .ok_or_else(Error::not_found)?;
    req.params = params;

    for mw in &route.middleware {
        req = mw.call(req).await?;
    }

    route.handler.call(req).await
}

/// The error boundary. Routing errors keep their status and title on the
/// wire; everything else is logged in full and leaves as a bare 500.
fn fail(err: Error) -> Response {
    match err {
        Error::Route { status, title } => Response::problem(status, &title),
        other => {
            error!("unexpected fault: {other}");
            Response::problem(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal: SIGTERM or Ctrl-C on Unix,
/// Ctrl-C only elsewhere.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
