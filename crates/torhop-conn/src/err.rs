//! Declare error types for torhop-conn

use thiserror::Error;
use torhop_socks::SocksStatus;

/// An error returned while opening a connection through a proxy.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A target was given for which no connection could be opened.
    #[error("Target was unusable: {0}")]
    UnusableTarget(String),

    /// The proxy answered our CONNECT request with a failure status.
    #[error("Proxy refused the connection: {0}")]
    ProxyRefused(SocksStatus),

    /// It took too long to establish this connection.
    #[error("Connection through the proxy timed out")]
    ConnTimeout,

    /// A protocol error while negotiating the SOCKS handshake.
    #[error("SOCKS handshake failed: {0}")]
    Socks(#[from] torhop_socks::Error),

    /// A failure while negotiating TLS with the target.
    #[error("TLS handshake failed: {0}")]
    Tls(#[from] async_native_tls::Error),

    /// An I/O error while opening a connection.
    #[error("I/O error while connecting: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error of some kind that should never occur.
    #[error("Internal error: {0}")]
    Internal(&'static str),
}

impl From<async_std::future::TimeoutError> for Error {
    fn from(_: async_std::future::TimeoutError) -> Error {
        Error::ConnTimeout
    }
}
