//! Implements the client side of the SOCKS protocol.
//!
//! SOCKS is an old and somewhat janky protocol for telling a TCP
//! proxy where to connect.  Versions 4, 4a, and 5 are sometimes
//! encountered in the wild; an anonymizing proxy such as a local Tor
//! client usually speaks all three.
//!
//! This crate tries to hide the actual details of the protocol, and
//! expose a stateful handshake type that negotiates a connection on
//! the client's behalf and eventually provides a [SocksReply] or an
//! error.  The crate does no I/O of its own: callers feed it the
//! bytes they have received and transmit the bytes it produces.
//!
//! A hostname given as the target of a request is sent to the proxy
//! in symbolic form, exactly as provided.  It is never resolved here,
//! so no DNS query for the target ever leaves the local host.
//!
//! For more information about SOCKS:
//!
//!   * SOCKS5 (which is preferred) is specified in
//!     [RFC 1928](https://tools.ietf.org/html/rfc1928), and see also
//!     [RFC 1929](https://tools.ietf.org/html/rfc1929) for
//!     Username/Password authentication in SOCKS5.
//!   * [The wikipedia article](https://en.wikipedia.org/wiki/SOCKS)
//!     is the best surviving documentation for SOCKS4 and SOCKS4a.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::exhaustive_structs)]

mod err;
mod handshake;
mod msg;
mod wire;

pub use err::Error;
pub use handshake::{Action, SocksClientHandshake};
pub use msg::{
    SocksAddr, SocksAuth, SocksCmd, SocksHostname, SocksReply, SocksRequest, SocksStatus,
    SocksVersion,
};

/// A Result type for the torhop_socks crate.
pub type Result<T> = std::result::Result<T, Error>;
