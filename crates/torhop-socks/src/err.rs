//! Declare an error type for the torhop-socks crate.

use thiserror::Error;

/// An error that occurs while negotiating a SOCKS handshake.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Message truncated: the caller should read more bytes and try again.
    #[error("Message truncated; need to wait for more")]
    Truncated,

    /// The proxy's reply violated the SOCKS protocol.
    #[error("SOCKS protocol syntax violation")]
    Syntax,

    /// The proxy spoke a protocol version we didn't expect.
    #[error("Unrecognized SOCKS protocol version {0}")]
    BadProtocol(u8),

    /// The request or reply used a SOCKS feature we don't support.
    #[error("SOCKS feature not supported")]
    NoSupport,

    /// The proxy rejected our authentication, or every method we offered.
    #[error("SOCKS authentication rejected by the proxy")]
    AuthRejected,

    /// The handshake was finished; no need to call this again.
    #[error("SOCKS handshake was finished; no need to call this again")]
    AlreadyFinished,
}
