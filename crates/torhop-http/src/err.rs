//! Declare torhop-http-specific errors.

use thiserror::Error;

/// An error originating from the torhop-http crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// We got an EOF before we were done with the headers.
    #[error("truncated HTTP headers")]
    TruncatedHeaders,

    /// Received a response that was longer than we were willing to
    /// accept.
    #[error("response too long; gave up after {0} bytes")]
    ResponseTooLong(usize),

    /// The request URI had no host to connect to.
    #[error("request URI has no host")]
    MissingHost,

    /// Error when parsing the HTTP response.
    #[error("Couldn't parse HTTP response")]
    Httparse(#[from] httparse::Error),

    /// Error while creating the HTTP request or response.
    #[error("Couldn't create HTTP request")]
    Http(#[from] http::Error),

    /// The transport failed to open a connection.
    #[error("Connection failed: {0}")]
    Connect(#[from] torhop_conn::Error),

    /// Io error while reading on the connection.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
