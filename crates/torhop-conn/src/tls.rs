//! Build TLS connections for use over a proxied stream, using the
//! async_native_tls crate.

use crate::Result;

use futures::io::{AsyncRead, AsyncWrite};
use std::io::{Error as IoError, Result as IoResult};

/// A CertifiedConn is a connection that may have authenticated using
/// a certificate.
///
/// When hostname verification is off, the peer certificate is the
/// only identity material a caller has; expose it so that callers can
/// pin certificates instead.
pub trait CertifiedConn {
    /// Return the DER-encoded certificate the peer presented, if it
    /// presented one.
    fn peer_certificate(&self) -> IoResult<Option<Vec<u8>>>;
}

/// A factory for TLS connections that does not check hostnames.
///
/// A client behind a SOCKS proxy never resolves the destination name
/// itself, so the usual check of the certificate subject against the
/// connection address has nothing trustworthy to compare: the proxy
/// decides what the name maps to.  Chain validation against the
/// system roots stays on unless you construct the connector with
/// [`TlsConnector::without_cert_verification`].
pub struct TlsConnector {
    /// The internal connector that we're wrapping with a new API
    connector: async_native_tls::TlsConnector,
}

impl TlsConnector {
    /// Construct a connector that validates certificate chains but
    /// skips hostname verification.
    pub fn new() -> Self {
        let mut builder = native_tls::TlsConnector::builder();
        // The scary name just means that we don't compare the
        // certificate subject to the hostname; the proxy resolves the
        // name, so there is no local name to compare against.
        builder.danger_accept_invalid_hostnames(true);

        TlsConnector {
            connector: builder.into(),
        }
    }

    /// Construct a connector that additionally accepts certificates
    /// that fail validation.
    ///
    /// Use this for targets whose certificate is self-signed and
    /// checked some other way, for instance by pinning through
    /// [`CertifiedConn::peer_certificate`].
    pub fn without_cert_verification() -> Self {
        let mut builder = native_tls::TlsConnector::builder();
        builder
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true);

        TlsConnector {
            connector: builder.into(),
        }
    }

    /// Negotiate TLS over an already-established stream.
    ///
    /// `hostname` is used for SNI only; it is not verified against
    /// the certificate.
    pub(crate) async fn handshake<S>(
        &self,
        hostname: &str,
        stream: S,
    ) -> Result<async_native_tls::TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        Ok(self.connector.connect(hostname, stream).await?)
    }
}

impl Default for TlsConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> CertifiedConn for async_native_tls::TlsStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn peer_certificate(&self) -> IoResult<Option<Vec<u8>>> {
        let cert = async_native_tls::TlsStream::peer_certificate(self);
        match cert {
            Ok(Some(c)) => {
                let der = c
                    .to_der()
                    .map_err(|e| IoError::new(std::io::ErrorKind::Other, e))?;
                Ok(Some(der))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(IoError::new(std::io::ErrorKind::Other, e)),
        }
    }
}

// A raw proxied stream has no certificate.
impl CertifiedConn for async_std::net::TcpStream {
    fn peer_certificate(&self) -> IoResult<Option<Vec<u8>>> {
        Ok(None)
    }
}
