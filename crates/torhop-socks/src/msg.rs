//! Structures that represent SOCKS messages

use crate::{Error, Result};

use caret::caret_int;
use std::convert::TryFrom;
use std::fmt;
use std::net::IpAddr;

/// A version of the SOCKS protocol that we can negotiate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(clippy::exhaustive_enums)]
pub enum SocksVersion {
    /// SOCKS4 or SOCKS4a, depending on the address given.
    V4,
    /// SOCKS5.
    V5,
}

impl TryFrom<u8> for SocksVersion {
    type Error = Error;
    fn try_from(v: u8) -> Result<SocksVersion> {
        match v {
            4 => Ok(SocksVersion::V4),
            5 => Ok(SocksVersion::V5),
            _ => Err(Error::BadProtocol(v)),
        }
    }
}

impl From<SocksVersion> for u8 {
    fn from(v: SocksVersion) -> u8 {
        match v {
            SocksVersion::V4 => 4,
            SocksVersion::V5 => 5,
        }
    }
}

/// A request that can be sent on a SOCKS connection.
///
/// Keep this object around after the handshake completes: it records
/// which version and command were negotiated.
#[derive(Clone, Debug)]
pub struct SocksRequest {
    /// SOCKS protocol version to negotiate.
    version: SocksVersion,
    /// The command to send to the proxy.
    cmd: SocksCmd,
    /// The target address.
    addr: SocksAddr,
    /// The target port.
    port: u16,
    /// Authentication information to present to the proxy.
    ///
    /// (Tor doesn't believe in SOCKS authentication, since it cannot
    /// possibly be secure.  Instead, it uses these fields for circuit
    /// isolation.)
    auth: SocksAuth,
}

/// An address sent or received as part of a SOCKS handshake
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::exhaustive_enums)]
pub enum SocksAddr {
    /// A regular DNS hostname, carried in symbolic form.
    ///
    /// The proxy, not this client, turns the name into an address:
    /// we never resolve it locally.
    Hostname(SocksHostname),
    /// An IP address.  (Prefer a hostname where you have one: a
    /// literal IP usually means that a name was looked up locally,
    /// which a leak-avoiding client should not do.)
    Ip(IpAddr),
}

/// A hostname for use with SOCKS.  It is limited in length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocksHostname(String);

/// Authentication material to present during a SOCKS handshake
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SocksAuth {
    /// Present no authentication.
    NoAuth,
    /// Socks4 authentication (a string) for the userid field.
    Socks4(Vec<u8>),
    /// Socks5 username/password authentication. (See RFC 1929.)
    Username(Vec<u8>, Vec<u8>),
}

caret_int! {
    /// Command sent to the proxy telling it what to do.
    pub struct SocksCmd(u8) {
        /// Connect to a remote TCP address:port.
        CONNECT = 1,
        /// Not supported when talking to Tor.
        BIND = 2,
        /// Not supported when talking to Tor.
        UDP_ASSOCIATE = 3,

        /// Lookup a hostname, return an IP address. (Tor only.)
        RESOLVE = 0xF0,
        /// Lookup an IP address, return a hostname. (Tor only.)
        RESOLVE_PTR = 0xF1,
    }
}

caret_int! {
    /// Possible reply status values from a SOCKS5 handshake.
    ///
    /// Note that the documentation for these values is kind of scant,
    /// and is limited to what the RFC says.  Note also that SOCKS4
    /// only represents success and failure.
    pub struct SocksStatus(u8) {
        /// RFC 1928: "succeeded"
        SUCCEEDED = 0x00,
        /// RFC 1928: "general SOCKS server failure"
        GENERAL_FAILURE = 0x01,
        /// RFC 1928: "connection not allowable by ruleset"
        NOT_ALLOWED = 0x02,
        /// RFC 1928: "Network unreachable"
        NETWORK_UNREACHABLE = 0x03,
        /// RFC 1928: "Host unreachable"
        HOST_UNREACHABLE = 0x04,
        /// RFC 1928: "Connection refused"
        CONNECTION_REFUSED = 0x05,
        /// RFC 1928: "TTL expired"
        TTL_EXPIRED = 0x06,
        /// RFC 1929: "Command not supported"
        COMMAND_NOT_SUPPORTED = 0x07,
        /// RFC 1929: "Address type not supported"
        ADDRTYPE_NOT_SUPPORTED = 0x08,
    }
}

impl SocksCmd {
    /// Return true if this is a command we can send.
    fn recognized(self) -> bool {
        matches!(
            self,
            SocksCmd::CONNECT | SocksCmd::RESOLVE | SocksCmd::RESOLVE_PTR
        )
    }
}

impl SocksStatus {
    /// Convert a SOCKS4 reply status into the closest SOCKS5
    /// equivalent.  (SOCKS4 statuses live in the 0x5A..0x5D range.)
    pub(crate) fn from_socks4_status(status: u8) -> Self {
        match status {
            0x5A => SocksStatus::SUCCEEDED,
            0x5B => SocksStatus::GENERAL_FAILURE,
            0x5C | 0x5D => SocksStatus::NOT_ALLOWED,
            _ => SocksStatus::GENERAL_FAILURE,
        }
    }
}

impl TryFrom<String> for SocksHostname {
    type Error = Error;
    fn try_from(s: String) -> Result<SocksHostname> {
        if s.len() > 255 {
            Err(Error::Syntax)
        } else {
            Ok(SocksHostname(s))
        }
    }
}

impl AsRef<str> for SocksHostname {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl From<SocksHostname> for String {
    fn from(s: SocksHostname) -> String {
        s.0
    }
}

impl SocksRequest {
    /// Create a SocksRequest with a given set of fields.
    ///
    /// Return an error if the inputs aren't supported or valid, or if
    /// the chosen protocol version cannot carry them: SOCKS4 has no
    /// username/password authentication and no IPv6 addresses, and
    /// SOCKS5 has no userid field.
    pub fn new(
        version: SocksVersion,
        cmd: SocksCmd,
        addr: SocksAddr,
        port: u16,
        auth: SocksAuth,
    ) -> Result<Self> {
        if !cmd.recognized() {
            return Err(Error::NoSupport);
        }
        if port == 0 {
            return Err(Error::Syntax);
        }
        match (version, &auth) {
            (SocksVersion::V4, SocksAuth::Username(_, _)) => return Err(Error::NoSupport),
            (SocksVersion::V5, SocksAuth::Socks4(_)) => return Err(Error::NoSupport),
            (_, SocksAuth::Username(user, pass)) => {
                if user.len() > 255 || pass.len() > 255 {
                    return Err(Error::Syntax);
                }
            }
            (_, _) => {}
        }
        if version == SocksVersion::V4 {
            if let SocksAddr::Ip(IpAddr::V6(_)) = addr {
                return Err(Error::NoSupport);
            }
        }

        Ok(SocksRequest {
            version,
            cmd,
            addr,
            port,
            auth,
        })
    }

    /// Return the negotiated version.
    pub fn version(&self) -> SocksVersion {
        self.version
    }

    /// Return the command to be sent.
    pub fn command(&self) -> SocksCmd {
        self.cmd
    }

    /// Return the authentication material for this request.
    pub fn auth(&self) -> &SocksAuth {
        &self.auth
    }

    /// Return the target port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Return the target address.
    pub fn addr(&self) -> &SocksAddr {
        &self.addr
    }
}

/// The proxy's final answer to a request.
///
/// A reply with a status other than [`SocksStatus::SUCCEEDED`] means
/// the proxy did not open the connection; the stream is useless
/// afterwards.
#[derive(Clone, Debug)]
pub struct SocksReply {
    /// The status the proxy reported.
    status: SocksStatus,
    /// The address the proxy bound for this connection, if it told us.
    addr: SocksAddr,
    /// The port the proxy bound for this connection, if it told us.
    port: u16,
}

impl SocksReply {
    /// Create a new SocksReply.
    pub(crate) fn new(status: SocksStatus, addr: SocksAddr, port: u16) -> Self {
        SocksReply { status, addr, port }
    }

    /// Return the status the proxy reported.
    pub fn status(&self) -> SocksStatus {
        self.status
    }

    /// Return the address the proxy bound, if any.  (Many proxies
    /// just report an all-zeros address here.)
    pub fn addr(&self) -> &SocksAddr {
        &self.addr
    }

    /// Return the port the proxy bound, if any.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for SocksAddr {
    /// Format a string (a hostname or IP address) corresponding to this
    /// SocksAddr.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksAddr::Ip(a) => write!(f, "{}", a),
            SocksAddr::Hostname(h) => write!(f, "{}", h.0),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::convert::TryInto;

    #[test]
    fn display_sa() {
        let a = SocksAddr::Ip(IpAddr::V4("127.0.0.1".parse().unwrap()));
        assert_eq!(a.to_string(), "127.0.0.1");

        let a = SocksAddr::Ip(IpAddr::V6("f00::9999".parse().unwrap()));
        assert_eq!(a.to_string(), "f00::9999");

        let a = SocksAddr::Hostname("www.torproject.org".to_string().try_into().unwrap());
        assert_eq!(a.to_string(), "www.torproject.org");
    }

    #[test]
    fn ok_request() {
        let localhost_v4 = SocksAddr::Ip(IpAddr::V4("127.0.0.1".parse().unwrap()));
        let r = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            localhost_v4.clone(),
            1024,
            SocksAuth::NoAuth,
        )
        .unwrap();
        assert_eq!(r.version(), SocksVersion::V4);
        assert_eq!(r.command(), SocksCmd::CONNECT);
        assert_eq!(r.addr(), &localhost_v4);
        assert_eq!(r.auth(), &SocksAuth::NoAuth);
    }

    #[test]
    fn bad_request() {
        let localhost_v4 = SocksAddr::Ip(IpAddr::V4("127.0.0.1".parse().unwrap()));
        let localhost_v6 = SocksAddr::Ip(IpAddr::V6("::1".parse().unwrap()));

        let e = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::BIND,
            localhost_v4.clone(),
            1024,
            SocksAuth::NoAuth,
        );
        assert!(matches!(e, Err(Error::NoSupport)));

        let e = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            localhost_v4.clone(),
            0,
            SocksAuth::NoAuth,
        );
        assert!(matches!(e, Err(Error::Syntax)));

        // SOCKS4 can't carry IPv6 or username/password.
        let e = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            localhost_v6,
            1024,
            SocksAuth::NoAuth,
        );
        assert!(matches!(e, Err(Error::NoSupport)));
        let e = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            localhost_v4.clone(),
            1024,
            SocksAuth::Username(b"nickm".to_vec(), Vec::new()),
        );
        assert!(matches!(e, Err(Error::NoSupport)));

        // SOCKS5 has no userid field.
        let e = SocksRequest::new(
            SocksVersion::V5,
            SocksCmd::CONNECT,
            localhost_v4.clone(),
            1024,
            SocksAuth::Socks4(b"nickm".to_vec()),
        );
        assert!(matches!(e, Err(Error::NoSupport)));

        // Over-long username/password fields don't fit in a message.
        let e = SocksRequest::new(
            SocksVersion::V5,
            SocksCmd::CONNECT,
            localhost_v4,
            1024,
            SocksAuth::Username(vec![b'x'; 300], Vec::new()),
        );
        assert!(matches!(e, Err(Error::Syntax)));
    }

    #[test]
    fn long_hostname() {
        let a: std::result::Result<SocksHostname, _> = "x".repeat(300).try_into();
        assert!(a.is_err());
    }

    #[test]
    fn socks4_status_mapping() {
        assert_eq!(
            SocksStatus::from_socks4_status(0x5A),
            SocksStatus::SUCCEEDED
        );
        assert_eq!(
            SocksStatus::from_socks4_status(0x5B),
            SocksStatus::GENERAL_FAILURE
        );
        assert_eq!(
            SocksStatus::from_socks4_status(0x5C),
            SocksStatus::NOT_ALLOWED
        );
        assert_eq!(
            SocksStatus::from_socks4_status(0x77),
            SocksStatus::GENERAL_FAILURE
        );
    }

    #[test]
    fn version_bytes() {
        assert_eq!(SocksVersion::try_from(5).unwrap(), SocksVersion::V5);
        assert_eq!(SocksVersion::try_from(4).unwrap(), SocksVersion::V4);
        assert!(matches!(
            SocksVersion::try_from(6),
            Err(Error::BadProtocol(6))
        ));
        assert_eq!(u8::from(SocksVersion::V5), 5);
    }
}
