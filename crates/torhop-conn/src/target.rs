//! Target addresses that keep their hostnames unresolved.

use crate::{Error, Result};

use torhop_socks::SocksAddr;

use std::convert::TryInto;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// The address of a stream target: a port, plus either a literal IP
/// address or a hostname kept in symbolic form.
///
/// A `TargetAddr` is never resolved on the local host.  When a
/// connection is opened through a SOCKS proxy, a hostname travels to
/// the proxy verbatim and the proxy performs name resolution.  That
/// keeps DNS queries for the target off the local network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetAddr {
    /// The host part of the address, in the form the proxy will see it.
    host: SocksAddr,
    /// The target port.
    port: u16,
}

impl TargetAddr {
    /// Construct a new TargetAddr from a host string and a port.
    ///
    /// If `host` parses as an IP literal it is kept as one; anything
    /// else is treated as a hostname and left symbolic.  No DNS
    /// lookup takes place, here or later.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(Error::UnusableTarget("port 0 is not usable".into()));
        }
        let host = match host.parse::<IpAddr>() {
            Ok(ip) => SocksAddr::Ip(ip),
            Err(_) => {
                if host.is_empty() {
                    return Err(Error::UnusableTarget("empty hostname".into()));
                }
                SocksAddr::Hostname(
                    host.to_string()
                        .try_into()
                        .map_err(|_| Error::UnusableTarget("hostname too long".into()))?,
                )
            }
        };
        Ok(TargetAddr { host, port })
    }

    /// Return the host part of this address.
    pub fn host(&self) -> &SocksAddr {
        &self.host
    }

    /// Return the port part of this address.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> TargetAddr {
        TargetAddr {
            host: SocksAddr::Ip(addr.ip()),
            port: addr.port(),
        }
    }
}

impl FromStr for TargetAddr {
    type Err = Error;

    /// Parse a `host:port` string, accepting `[addr]:port` for IPv6
    /// literals.  The host part is never resolved.
    fn from_str(s: &str) -> Result<TargetAddr> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::UnusableTarget(format!("{:?} is not host:port", s)))?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::UnusableTarget(format!("bad port in {:?}", s)))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        TargetAddr::new(host, port)
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            SocksAddr::Ip(IpAddr::V6(ip)) => write!(f, "[{}]:{}", ip, self.port),
            host => write!(f, "{}:{}", host, self.port),
        }
    }
}
