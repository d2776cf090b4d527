//! Types for opening connections to a stream target through a proxy.

pub mod socks;

use crate::target::TargetAddr;
use crate::tls::CertifiedConn;
use crate::Result;

use async_trait::async_trait;
use futures::io::{AsyncRead, AsyncWrite};

/// A Transport knows how to open a connection to a target, in a way
/// that the rest of a client can use.
///
/// Every call opens exactly one new connection; there is no pooling
/// and no retry.  The target's hostname, if it has one, reaches the
/// other side of the transport unresolved.
#[async_trait]
pub trait Transport {
    /// The type of connection returned by this transport.  This
    /// should be an asynchronous stream.
    type Connection: AsyncRead + AsyncWrite + Send + Unpin + CertifiedConn + 'static;

    /// Try to open a connection to a given target.
    async fn connect(&self, target: &TargetAddr) -> Result<Self::Connection>;
}
