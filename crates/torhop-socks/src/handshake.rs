//! Types to implement the client side of the SOCKS handshake.

use crate::msg::{SocksAddr, SocksAuth, SocksReply, SocksRequest, SocksStatus, SocksVersion};
use crate::wire::{Readable, Reader, Writeable, Writer};
use crate::{Error, Result};

use std::net::IpAddr;

/// Constant for Username/Password-style authentication.
/// (See RFC 1929)
const USERNAME_PASSWORD: u8 = 0x02;
/// Constant for "no authentication".
const NO_AUTHENTICATION: u8 = 0x00;
/// Constant for "no acceptable method".
const NO_ACCEPTABLE: u8 = 0xFF;

/// An ongoing SOCKS handshake, from the client's side.
///
/// To perform a handshake, call the
/// [SocksClientHandshake::handshake] method repeatedly with the bytes
/// received so far, until the resulting [Action] has `finished` set
/// to true.  The first call (with no input) produces the message that
/// opens the negotiation.
#[derive(Clone, Debug)]
pub struct SocksClientHandshake {
    /// The request we are negotiating on the proxy connection.
    request: SocksRequest,
    /// Current state of the handshake. Each completed message
    /// advances the state.
    state: State,
    /// The proxy's final reply, once it has arrived.
    reply: Option<SocksReply>,
}

/// Possible state for the client side of a SOCKS connection.
///
/// Each completed message advances the state.
#[derive(Clone, Debug, Copy, PartialEq)]
enum State {
    /// Starting state: we have not sent anything yet.
    Initial,
    /// SOCKS5: we've sent our method list, and are waiting for the
    /// proxy to pick one.
    MethodWait,
    /// SOCKS5: we've sent Username/Password authentication, and are
    /// waiting for the proxy to accept it.
    AuthWait,
    /// We've sent the request, and are waiting for the proxy's reply.
    ReplyWait,
    /// Ending state: the proxy has replied, successfully or not.
    Done,
}

/// An action to take in response to progress on a SOCKS handshake.
#[derive(Clone, Debug)]
#[allow(clippy::exhaustive_structs)]
pub struct Action {
    /// If nonzero, this many bytes should be drained from the
    /// received input.
    pub drain: usize,
    /// If nonempty, this message should be sent to the proxy.
    pub reply: Vec<u8>,
    /// If true, then this handshake is over, either successfully or not.
    pub finished: bool,
}

impl SocksClientHandshake {
    /// Construct a new SocksClientHandshake that will negotiate `request`.
    pub fn new(request: SocksRequest) -> Self {
        SocksClientHandshake {
            request,
            state: State::Initial,
            reply: None,
        }
    }

    /// Try to advance the handshake, given some received input in
    /// `input`.
    ///
    /// If there isn't enough input, gives [Error::Truncated]: read
    /// more bytes from the proxy and call this method again.  Other
    /// errors indicate a failure.
    ///
    /// On success, return an Action describing what to send to the
    /// proxy, and how much of the input to consume.
    pub fn handshake(&mut self, input: &[u8]) -> Result<Action> {
        match self.state {
            State::Initial => self.start(),
            State::MethodWait => self.v5_method_chosen(input),
            State::AuthWait => self.v5_auth_answered(input),
            State::ReplyWait => match self.request.version() {
                SocksVersion::V4 => self.v4_reply(input),
                SocksVersion::V5 => self.v5_reply(input),
            },
            State::Done => Err(Error::AlreadyFinished),
        }
    }

    /// Produce the message that opens the negotiation.
    fn start(&mut self) -> Result<Action> {
        match self.request.version() {
            SocksVersion::V4 => self.v4_begin(),
            SocksVersion::V5 => self.v5_begin(),
        }
    }

    /// SOCKS4 and SOCKS4a put the whole request in the opening
    /// message.  A hostname travels after a 0.0.0.1 marker address,
    /// in symbolic form.
    fn v4_begin(&mut self) -> Result<Action> {
        let mut msg = Vec::new();
        msg.write_u8(4);
        msg.write_u8(self.request.command().into());
        msg.write_u16(self.request.port());
        let userid: &[u8] = match self.request.auth() {
            SocksAuth::Socks4(user) => &user[..],
            _ => &[],
        };
        match self.request.addr() {
            SocksAddr::Ip(IpAddr::V4(ip)) => {
                msg.write_u32((*ip).into());
                msg.write_all(userid);
                msg.write_u8(0);
            }
            SocksAddr::Hostname(h) => {
                msg.write_u32(1);
                msg.write_all(userid);
                msg.write_u8(0);
                msg.write_all(h.as_ref().as_bytes());
                msg.write_u8(0);
            }
            // SocksRequest::new won't construct this combination.
            SocksAddr::Ip(IpAddr::V6(_)) => return Err(Error::NoSupport),
        }

        self.state = State::ReplyWait;
        Ok(Action {
            drain: 0,
            reply: msg,
            finished: false,
        })
    }

    /// SOCKS5: offer the authentication methods that match our
    /// request.
    fn v5_begin(&mut self) -> Result<Action> {
        let mut msg = Vec::new();
        msg.write_u8(5);
        match self.request.auth() {
            SocksAuth::NoAuth => {
                msg.write_u8(1);
                msg.write_u8(NO_AUTHENTICATION);
            }
            SocksAuth::Username(_, _) => {
                msg.write_u8(2);
                msg.write_u8(USERNAME_PASSWORD);
                msg.write_u8(NO_AUTHENTICATION);
            }
            // SocksRequest::new won't construct this combination.
            _ => return Err(Error::NoSupport),
        }

        self.state = State::MethodWait;
        Ok(Action {
            drain: 0,
            reply: msg,
            finished: false,
        })
    }

    /// SOCKS5: the proxy has picked an authentication method.
    fn v5_method_chosen(&mut self, input: &[u8]) -> Result<Action> {
        let mut r = Reader::from_slice(input);
        let version = r.take_u8()?;
        if version != 5 {
            return Err(Error::BadProtocol(version));
        }
        let method = r.take_u8()?;

        if method == NO_AUTHENTICATION {
            let msg = self.v5_request_msg();
            self.state = State::ReplyWait;
            Ok(Action {
                drain: r.consumed(),
                reply: msg,
                finished: false,
            })
        } else if method == USERNAME_PASSWORD {
            let msg = match self.request.auth() {
                SocksAuth::Username(user, pass) => {
                    let mut msg = Vec::new();
                    msg.write_u8(1);
                    msg.write_u8(user.len() as u8);
                    msg.write_all(user);
                    msg.write_u8(pass.len() as u8);
                    msg.write_all(pass);
                    msg
                }
                // The proxy picked a method we never offered.
                _ => return Err(Error::Syntax),
            };
            self.state = State::AuthWait;
            Ok(Action {
                drain: r.consumed(),
                reply: msg,
                finished: false,
            })
        } else if method == NO_ACCEPTABLE {
            Err(Error::AuthRejected)
        } else {
            Err(Error::Syntax)
        }
    }

    /// SOCKS5: the proxy has answered our Username/Password
    /// sub-negotiation.
    fn v5_auth_answered(&mut self, input: &[u8]) -> Result<Action> {
        let mut r = Reader::from_slice(input);
        let version = r.take_u8()?;
        if version != 1 {
            return Err(Error::Syntax);
        }
        let status = r.take_u8()?;
        if status != 0 {
            return Err(Error::AuthRejected);
        }

        let msg = self.v5_request_msg();
        self.state = State::ReplyWait;
        Ok(Action {
            drain: r.consumed(),
            reply: msg,
            finished: false,
        })
    }

    /// Encode the SOCKS5 request message.  A hostname goes on the
    /// wire as a DOMAINNAME address, exactly as given.
    fn v5_request_msg(&self) -> Vec<u8> {
        let mut msg = Vec::new();
        msg.write_u8(5);
        msg.write_u8(self.request.command().into());
        msg.write_u8(0); // reserved.
        msg.write(self.request.addr());
        msg.write_u16(self.request.port());
        msg
    }

    /// SOCKS5: parse the proxy's final reply.
    fn v5_reply(&mut self, input: &[u8]) -> Result<Action> {
        let mut r = Reader::from_slice(input);
        let version = r.take_u8()?;
        if version != 5 {
            return Err(Error::BadProtocol(version));
        }
        let status: SocksStatus = r.take_u8()?.into();
        let _reserved = r.take_u8()?;
        let addr: SocksAddr = r.extract()?;
        let port = r.take_u16()?;

        self.state = State::Done;
        self.reply = Some(SocksReply::new(status, addr, port));

        Ok(Action {
            drain: r.consumed(),
            reply: Vec::new(),
            finished: true,
        })
    }

    /// SOCKS4: parse the proxy's final reply.
    fn v4_reply(&mut self, input: &[u8]) -> Result<Action> {
        let mut r = Reader::from_slice(input);
        let version = r.take_u8()?;
        if version != 0 {
            return Err(Error::Syntax);
        }
        let status = SocksStatus::from_socks4_status(r.take_u8()?);
        let port = r.take_u16()?;
        let ip: std::net::Ipv4Addr = r.take_u32()?.into();

        self.state = State::Done;
        self.reply = Some(SocksReply::new(status, SocksAddr::Ip(ip.into()), port));

        Ok(Action {
            drain: r.consumed(),
            reply: Vec::new(),
            finished: true,
        })
    }

    /// Return true if this handshake is finished.
    pub fn finished(&self) -> bool {
        self.state == State::Done
    }

    /// Consume this handshake's state; if it finished successfully,
    /// return the proxy's reply.
    pub fn into_reply(self) -> Option<SocksReply> {
        self.reply
    }
}

impl Readable for SocksAddr {
    fn take_from(r: &mut Reader<'_>) -> Result<SocksAddr> {
        let atype = r.take_u8()?;
        match atype {
            1 => {
                let ip4: std::net::Ipv4Addr = r.take_u32()?.into();
                Ok(SocksAddr::Ip(ip4.into()))
            }
            3 => {
                use std::convert::TryInto;
                let hlen = r.take_u8()?;
                let hostname = r.take(hlen as usize)?;
                let hostname = std::str::from_utf8(hostname)
                    .map_err(|_| Error::Syntax)?
                    .to_string();
                Ok(SocksAddr::Hostname(hostname.try_into()?))
            }
            4 => {
                let body = r.take(16)?;
                let mut octets = [0_u8; 16];
                octets.copy_from_slice(body);
                let ip6: std::net::Ipv6Addr = octets.into();
                Ok(SocksAddr::Ip(ip6.into()))
            }
            _ => Err(Error::Syntax),
        }
    }
}

impl Writeable for SocksAddr {
    fn write_onto<W: Writer + ?Sized>(&self, w: &mut W) {
        match self {
            SocksAddr::Ip(IpAddr::V4(ip)) => {
                w.write_u8(1);
                w.write_u32((*ip).into());
            }
            SocksAddr::Ip(IpAddr::V6(ip)) => {
                w.write_u8(4);
                w.write_all(&ip.octets());
            }
            SocksAddr::Hostname(h) => {
                // SocksHostname is checked at construction to fit in a byte.
                let h = h.as_ref();
                w.write_u8(3);
                w.write_u8(h.len() as u8);
                w.write_all(h.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::msg::SocksCmd;
    use std::convert::TryInto;

    /// Shorthand for a CONNECT request to www.example.com:443.
    fn example_request(version: SocksVersion, auth: SocksAuth) -> SocksRequest {
        SocksRequest::new(
            version,
            SocksCmd::CONNECT,
            SocksAddr::Hostname("www.example.com".to_string().try_into().unwrap()),
            443,
            auth,
        )
        .unwrap()
    }

    #[test]
    fn v5_noauth() {
        let mut hs = SocksClientHandshake::new(example_request(
            SocksVersion::V5,
            SocksAuth::NoAuth,
        ));

        // Opening message: we offer "no authentication" only.
        let action = hs.handshake(&[]).unwrap();
        assert_eq!(action.drain, 0);
        assert_eq!(action.reply, [5, 1, 0]);
        assert!(!action.finished);

        // Proxy picks "no authentication"; we send the request.
        let action = hs.handshake(&[5, 0]).unwrap();
        assert_eq!(action.drain, 2);
        let mut expected = vec![5, 1, 0, 3, 15];
        expected.extend_from_slice(b"www.example.com");
        expected.extend_from_slice(&[0x01, 0xBB]);
        assert_eq!(action.reply, expected);
        assert!(!action.finished);

        // Proxy reports success.
        let action = hs.handshake(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(action.drain, 10);
        assert!(action.reply.is_empty());
        assert!(action.finished);
        assert!(hs.finished());

        let reply = hs.into_reply().unwrap();
        assert_eq!(reply.status(), SocksStatus::SUCCEEDED);
        assert_eq!(reply.port(), 0);
    }

    #[test]
    fn v5_username_password() {
        let auth = SocksAuth::Username(b"user".to_vec(), b"pass".to_vec());
        let mut hs = SocksClientHandshake::new(example_request(SocksVersion::V5, auth));

        let action = hs.handshake(&[]).unwrap();
        assert_eq!(action.reply, [5, 2, 2, 0]);

        // Proxy picks username/password; we send RFC 1929
        // sub-negotiation.
        let action = hs.handshake(&[5, 2]).unwrap();
        assert_eq!(action.drain, 2);
        let mut expected = vec![1, 4];
        expected.extend_from_slice(b"user");
        expected.push(4);
        expected.extend_from_slice(b"pass");
        assert_eq!(action.reply, expected);

        // Proxy accepts the credentials; we send the request.
        let action = hs.handshake(&[1, 0]).unwrap();
        assert_eq!(action.drain, 2);
        assert_eq!(&action.reply[..3], &[5, 1, 0]);

        // Proxy reports success with a bound address.
        let action = hs
            .handshake(&[5, 0, 0, 1, 127, 0, 0, 1, 0x1F, 0x90])
            .unwrap();
        assert!(action.finished);
        let reply = hs.into_reply().unwrap();
        assert_eq!(reply.status(), SocksStatus::SUCCEEDED);
        assert_eq!(
            reply.addr(),
            &SocksAddr::Ip("127.0.0.1".parse::<std::net::IpAddr>().unwrap())
        );
        assert_eq!(reply.port(), 8080);
    }

    #[test]
    fn v5_auth_rejected() {
        let auth = SocksAuth::Username(b"user".to_vec(), b"pass".to_vec());
        let mut hs = SocksClientHandshake::new(example_request(SocksVersion::V5, auth));

        let _ = hs.handshake(&[]).unwrap();
        // Proxy refuses every method we offered.
        let e = hs.handshake(&[5, 0xFF]);
        assert!(matches!(e, Err(Error::AuthRejected)));

        // Or: the proxy accepts the method but rejects the password.
        let auth = SocksAuth::Username(b"user".to_vec(), b"pass".to_vec());
        let mut hs = SocksClientHandshake::new(example_request(SocksVersion::V5, auth));
        let _ = hs.handshake(&[]).unwrap();
        let _ = hs.handshake(&[5, 2]).unwrap();
        let e = hs.handshake(&[1, 1]);
        assert!(matches!(e, Err(Error::AuthRejected)));
    }

    #[test]
    fn v5_refused() {
        let mut hs = SocksClientHandshake::new(example_request(
            SocksVersion::V5,
            SocksAuth::NoAuth,
        ));
        let _ = hs.handshake(&[]).unwrap();
        let _ = hs.handshake(&[5, 0]).unwrap();

        // "connection not allowable by ruleset"
        let action = hs.handshake(&[5, 2, 0, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(action.finished);
        let reply = hs.into_reply().unwrap();
        assert_eq!(reply.status(), SocksStatus::NOT_ALLOWED);
    }

    #[test]
    fn v5_truncated_and_leftover() {
        let mut hs = SocksClientHandshake::new(example_request(
            SocksVersion::V5,
            SocksAuth::NoAuth,
        ));
        let _ = hs.handshake(&[]).unwrap();

        // Not even a whole method-choice message yet.
        assert!(matches!(hs.handshake(&[5]), Err(Error::Truncated)));

        // Method choice and the first bytes of the reply arrive
        // together; drain tells the caller where the boundary is.
        let action = hs.handshake(&[5, 0, 5, 0, 0]).unwrap();
        assert_eq!(action.drain, 2);

        assert!(matches!(hs.handshake(&[5, 0, 0]), Err(Error::Truncated)));
        let action = hs.handshake(&[5, 0, 0, 1, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(action.finished);
        assert!(matches!(hs.handshake(&[0]), Err(Error::AlreadyFinished)));
    }

    #[test]
    fn v4a_hostname() {
        let request = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            SocksAddr::Hostname("example.com".to_string().try_into().unwrap()),
            80,
            SocksAuth::Socks4(b"sue".to_vec()),
        )
        .unwrap();
        let mut hs = SocksClientHandshake::new(request);

        let action = hs.handshake(&[]).unwrap();
        let mut expected = vec![4, 1, 0, 80, 0, 0, 0, 1];
        expected.extend_from_slice(b"sue");
        expected.push(0);
        expected.extend_from_slice(b"example.com");
        expected.push(0);
        assert_eq!(action.reply, expected);
        assert!(!action.finished);

        let action = hs.handshake(&[0, 0x5A, 0, 80, 0, 0, 0, 0]).unwrap();
        assert_eq!(action.drain, 8);
        assert!(action.finished);
        let reply = hs.into_reply().unwrap();
        assert_eq!(reply.status(), SocksStatus::SUCCEEDED);
    }

    #[test]
    fn v4_ip_refused() {
        let request = SocksRequest::new(
            SocksVersion::V4,
            SocksCmd::CONNECT,
            SocksAddr::Ip("192.0.2.7".parse().unwrap()),
            443,
            SocksAuth::NoAuth,
        )
        .unwrap();
        let mut hs = SocksClientHandshake::new(request);

        let action = hs.handshake(&[]).unwrap();
        assert_eq!(action.reply, [4, 1, 1, 0xBB, 192, 0, 2, 7, 0]);

        let action = hs.handshake(&[0, 0x5B, 0, 0, 0, 0, 0, 0]).unwrap();
        assert!(action.finished);
        let reply = hs.into_reply().unwrap();
        assert_eq!(reply.status(), SocksStatus::GENERAL_FAILURE);
    }

    #[test]
    fn v5_ipv6_target() {
        let request = SocksRequest::new(
            SocksVersion::V5,
            SocksCmd::CONNECT,
            SocksAddr::Ip("2001:db8::1".parse().unwrap()),
            443,
            SocksAuth::NoAuth,
        )
        .unwrap();
        let mut hs = SocksClientHandshake::new(request);
        let _ = hs.handshake(&[]).unwrap();
        let action = hs.handshake(&[5, 0]).unwrap();

        let mut expected = vec![5, 1, 0, 4];
        expected.extend_from_slice(&"2001:db8::1".parse::<std::net::Ipv6Addr>().unwrap().octets());
        expected.extend_from_slice(&[0x01, 0xBB]);
        assert_eq!(action.reply, expected);
    }

    #[test]
    fn v5_bad_version_in_reply() {
        let mut hs = SocksClientHandshake::new(example_request(
            SocksVersion::V5,
            SocksAuth::NoAuth,
        ));
        let _ = hs.handshake(&[]).unwrap();
        let e = hs.handshake(&[4, 0]);
        assert!(matches!(e, Err(Error::BadProtocol(4))));
    }
}
