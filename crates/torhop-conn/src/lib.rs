//! Open client connections through a SOCKS proxy, without resolving
//! hostnames locally.
//!
//! When a client routes its traffic over an anonymizing proxy (such
//! as a local Tor client's SOCKS port), it matters that the
//! destination hostname is never resolved on the local host: a DNS
//! query would tell the local network exactly where the client is
//! about to connect, defeating the point of the proxy.  This crate
//! implements [`Transport`]s that hand the hostname to the proxy in
//! symbolic form, so that name resolution happens at the proxy (or at
//! the Tor exit it stands for) instead.
//!
//! For TLS targets, [`SocksTlsTransport`] negotiates TLS against the
//! final destination over the proxied stream.  TLS hostname
//! verification is disabled: the proxy, not this host, decides what
//! the name resolves to, so there is no locally trustworthy name to
//! check the certificate against.  Certificate chains are still
//! validated by default; callers who need more can fetch the peer
//! certificate through [`CertifiedConn`] and pin it.
//!
//! There is no pooling, retry, or caching here: every call to
//! [`Transport::connect`] makes exactly one attempt, and failures
//! from the socket and TLS layers propagate unchanged.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod err;
mod target;
pub mod tls;
pub mod transport;

pub use err::Error;
pub use target::TargetAddr;
pub use tls::{CertifiedConn, TlsConnector};
pub use transport::socks::{SocksTlsTransport, SocksTransport};
pub use transport::Transport;

pub use torhop_socks::{SocksAuth, SocksStatus, SocksVersion};

/// A Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
