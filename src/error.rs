//! Unified error type.

use http::StatusCode;

/// The error type flowing through the dispatch pipeline.
///
/// [`Error::Route`] is the deliberate failure channel: middleware and
/// handlers raise it with a status code and a client-facing title, and the
/// dispatch boundary turns it into an `application/problem+json` response
/// with exactly that status. Every other variant is an unexpected fault —
/// logged in full, surfaced to the client as a bare 500.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Deliberate HTTP failure raised by middleware or a handler.
    #[error("{title}")]
    Route { status: StatusCode, title: String },

    /// Listener or connection I/O failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else that went wrong while handling a request.
    #[error("unexpected: {0}")]
    Unexpected(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// A routing error with the given status and client-facing title.
    ///
    /// ```rust
    /// use switchboard::{Error, StatusCode};
    ///
    /// let err = Error::new(StatusCode::BAD_REQUEST, "missing field `name`");
    /// ```
    pub fn new(status: StatusCode, title: impl Into<String>) -> Self {
        Self::Route { status, title: title.into() }
    }

    /// The 404 raised when no route matches a request.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "route not found")
    }

    /// Wraps an arbitrary failure into the unexpected-fault channel.
    pub fn unexpected(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self::Unexpected(err.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Unexpected(Box::new(err))
    }
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Self::Unexpected(Box::new(err))
    }
}
