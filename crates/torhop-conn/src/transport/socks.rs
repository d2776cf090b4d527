//! Transports that open their connections by way of a SOCKS proxy.

use crate::target::TargetAddr;
use crate::tls::TlsConnector;
use crate::transport::Transport;
use crate::{Error, Result};

use torhop_socks::{
    SocksAuth, SocksClientHandshake, SocksCmd, SocksReply, SocksRequest, SocksStatus, SocksVersion,
};

use async_std::future::timeout;
use async_std::net::TcpStream;
use async_trait::async_trait;
use futures::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, trace};

/// Default time limit for a whole connection attempt.
///
/// A CONNECT relayed over an anonymizing network can legitimately
/// take a while, but not forever.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// A Transport that opens raw TCP streams by way of a SOCKS proxy.
///
/// The target hostname is handed to the proxy in symbolic form; no
/// local name resolution takes place.  This transport is useful on
/// its own for cleartext targets, such as onion services reached over
/// a Tor proxy.  For TLS targets, see [`SocksTlsTransport`].
#[derive(Clone, Debug)]
pub struct SocksTransport {
    /// Address of the SOCKS proxy itself.
    ///
    /// This is the one address we dial directly, and the only place a
    /// `SocketAddr` appears in a connection attempt.
    proxy_addr: SocketAddr,
    /// Which version of the SOCKS protocol to speak.
    version: SocksVersion,
    /// Authentication to present to the proxy.
    auth: SocksAuth,
    /// Time limit for a whole connection attempt.
    connect_timeout: Duration,
}

impl SocksTransport {
    /// Construct a new SocksTransport that speaks SOCKS5 to the proxy
    /// at `proxy_addr`, with no authentication.
    pub fn new(proxy_addr: SocketAddr) -> Self {
        SocksTransport {
            proxy_addr,
            version: SocksVersion::V5,
            auth: SocksAuth::NoAuth,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Switch to a different version of the SOCKS protocol.
    pub fn set_version(&mut self, version: SocksVersion) {
        self.version = version;
    }

    /// Present `auth` to the proxy on every connection.
    ///
    /// (A Tor proxy doesn't check these credentials, but uses them to
    /// put streams with different credentials on different circuits.)
    pub fn set_auth(&mut self, auth: SocksAuth) {
        self.auth = auth;
    }

    /// Change the time limit for connection attempts.
    pub fn set_connect_timeout(&mut self, connect_timeout: Duration) {
        self.connect_timeout = connect_timeout;
    }

    /// Return the address of the proxy we connect through.
    pub fn proxy_addr(&self) -> SocketAddr {
        self.proxy_addr
    }

    /// Return the configured time limit for connection attempts.
    fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Open a TCP stream to the proxy and negotiate a CONNECT for
    /// `target` on it.
    async fn connect_through_proxy(&self, target: &TargetAddr) -> Result<TcpStream> {
        let request = SocksRequest::new(
            self.version,
            SocksCmd::CONNECT,
            target.host().clone(),
            target.port(),
            self.auth.clone(),
        )?;

        let mut stream = TcpStream::connect(self.proxy_addr).await?;
        let reply = run_handshake(&mut stream, request).await?;
        if reply.status() != SocksStatus::SUCCEEDED {
            return Err(Error::ProxyRefused(reply.status()));
        }
        trace!("Proxy bound address is {}:{}", reply.addr(), reply.port());
        Ok(stream)
    }
}

#[async_trait]
impl Transport for SocksTransport {
    type Connection = TcpStream;

    async fn connect(&self, target: &TargetAddr) -> Result<Self::Connection> {
        info!(
            "Opening a stream to {} via the proxy at {}",
            target, self.proxy_addr
        );
        timeout(self.connect_timeout(), self.connect_through_proxy(target)).await?
    }
}

/// A Transport that opens TLS connections by way of a SOCKS proxy.
///
/// The TCP stream is proxied exactly as with [`SocksTransport`], and
/// then TLS is negotiated against the final destination over it.
/// The target hostname is used for SNI but is not verified against
/// the certificate; see [`TlsConnector`] for why, and for how chain
/// validation is handled.
pub struct SocksTlsTransport {
    /// The underlying proxied-TCP transport.
    socks: SocksTransport,
    /// Connector used to wrap proxied streams in TLS.
    tls: TlsConnector,
}

impl SocksTlsTransport {
    /// Construct a new SocksTlsTransport that speaks SOCKS5 to the
    /// proxy at `proxy_addr` and validates certificate chains, but
    /// not hostnames.
    pub fn new(proxy_addr: SocketAddr) -> Self {
        SocksTlsTransport {
            socks: SocksTransport::new(proxy_addr),
            tls: TlsConnector::new(),
        }
    }

    /// As [`SocksTlsTransport::new`], but use `tls` to build the TLS
    /// connections.
    pub fn with_connector(proxy_addr: SocketAddr, tls: TlsConnector) -> Self {
        SocksTlsTransport {
            socks: SocksTransport::new(proxy_addr),
            tls,
        }
    }

    /// Return a mutable reference to the SOCKS settings, for
    /// configuring version, authentication, and timeout.
    pub fn socks_mut(&mut self) -> &mut SocksTransport {
        &mut self.socks
    }
}

#[async_trait]
impl Transport for SocksTlsTransport {
    type Connection = async_native_tls::TlsStream<TcpStream>;

    async fn connect(&self, target: &TargetAddr) -> Result<Self::Connection> {
        info!(
            "Opening a TLS stream to {} via the proxy at {}",
            target,
            self.socks.proxy_addr()
        );
        timeout(self.socks.connect_timeout(), async {
            let stream = self.socks.connect_through_proxy(target).await?;

            // SNI carries the symbolic hostname; the certificate
            // subject is not checked against it.
            let hostname = target.host().to_string();
            info!("Negotiating TLS with {}", target);
            self.tls.handshake(&hostname, stream).await
        })
        .await?
    }
}

/// Drive `request` over `stream` until the proxy's reply arrives or
/// the negotiation fails.
pub(crate) async fn run_handshake<S>(stream: &mut S, request: SocksRequest) -> Result<SocksReply>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let mut handshake = SocksClientHandshake::new(request);
    let mut inbuf = [0_u8; 1024];
    let mut n_read = 0;
    loop {
        // Try to advance the handshake.
        let action = match handshake.handshake(&inbuf[..n_read]) {
            Err(torhop_socks::Error::Truncated) => {
                // Read some more stuff.
                let n = stream.read(&mut inbuf[n_read..]).await?;
                if n == 0 {
                    return Err(Error::Io(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "proxy closed the connection mid-handshake",
                    )));
                }
                n_read += n;
                continue;
            }
            Err(e) => return Err(e.into()),
            Ok(action) => action,
        };

        // Consume the bytes the handshake used, and send the message
        // it produced, if any.
        if action.drain > 0 {
            inbuf.copy_within(action.drain..n_read, 0);
            n_read -= action.drain;
        }
        if !action.reply.is_empty() {
            stream.write_all(&action.reply[..]).await?;
            stream.flush().await?;
        }
        if action.finished {
            break;
        }
    }

    handshake
        .into_reply()
        .ok_or(Error::Internal("SOCKS handshake finished without a reply"))
}
