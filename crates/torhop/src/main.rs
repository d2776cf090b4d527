//! A minimal fetcher that routes everything through a SOCKS proxy.
//!
//! Give it a URL and the address of a SOCKS proxy (a local Tor
//! client's SOCKS port, by default), and it prints the response body
//! to stdout.  The URL's hostname is never resolved locally: it
//! travels to the proxy in symbolic form, and for https URLs the TLS
//! handshake runs against the destination with hostname verification
//! off, as the proxy model requires.

#![warn(missing_docs)]

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use torhop_conn::{SocksAuth, SocksTlsTransport, SocksTransport, SocksVersion, TlsConnector};
use torhop_http::fetch;

use anyhow::{anyhow, Context, Result};
use argh::FromArgs;
use tracing::info;

#[derive(FromArgs, Debug)]
/// Fetch a URL through a SOCKS proxy, without resolving its hostname
/// locally.
///
/// This is a demo; you get no stability guarantee.
struct Args {
    /// address of the SOCKS proxy (default: Tor's 127.0.0.1:9050)
    #[argh(option, default = "default_proxy()")]
    proxy: SocketAddr,
    /// speak SOCKS4a to the proxy instead of SOCKS5
    #[argh(switch)]
    socks4a: bool,
    /// username to present to the proxy (a Tor proxy uses this for
    /// stream isolation)
    #[argh(option)]
    username: Option<String>,
    /// password to present to the proxy
    #[argh(option)]
    password: Option<String>,
    /// time limit for the whole connection attempt, in seconds
    #[argh(option, default = "60")]
    timeout: u64,
    /// accept TLS certificates that fail validation
    #[argh(switch)]
    insecure: bool,
    /// enable trace-level logging
    #[argh(switch)]
    trace: bool,
    /// the http:// or https:// URL to fetch
    #[argh(positional)]
    url: String,
}

/// The default proxy address: a local Tor client's SOCKS port.
fn default_proxy() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9050))
}

/// Work out which authentication to present, from the command line.
fn auth_from_args(args: &Args) -> Result<SocksAuth> {
    if args.username.is_none() && args.password.is_some() {
        return Err(anyhow!("--password doesn't make sense without --username"));
    }
    Ok(match (&args.username, args.socks4a) {
        (None, _) => SocksAuth::NoAuth,
        (Some(user), true) => SocksAuth::Socks4(user.clone().into_bytes()),
        (Some(user), false) => SocksAuth::Username(
            user.clone().into_bytes(),
            args.password.clone().unwrap_or_default().into_bytes(),
        ),
    })
}

/// Apply the command-line SOCKS settings to a transport.
fn configure_socks(socks: &mut SocksTransport, args: &Args) -> Result<()> {
    if args.socks4a {
        socks.set_version(SocksVersion::V4);
    }
    socks.set_auth(auth_from_args(args)?);
    socks.set_connect_timeout(Duration::from_secs(args.timeout));
    Ok(())
}

fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let filt = if args.trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(filt)
        .with_writer(std::io::stderr)
        .init();

    let uri: http::Uri = args.url.parse().context("Couldn't parse the URL")?;
    let https = uri.scheme() == Some(&http::uri::Scheme::HTTPS);
    let req = http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Vec::new())
        .context("Couldn't build the request")?;

    async_std::task::block_on(async {
        let response = if https {
            let tls = if args.insecure {
                TlsConnector::without_cert_verification()
            } else {
                TlsConnector::new()
            };
            let mut transport = SocksTlsTransport::with_connector(args.proxy, tls);
            configure_socks(transport.socks_mut(), &args)?;
            fetch(&transport, req).await?
        } else {
            let mut transport = SocksTransport::new(args.proxy);
            configure_socks(&mut transport, &args)?;
            fetch(&transport, req).await?
        };

        info!("Got HTTP status {}", response.status());
        std::io::stdout()
            .write_all(response.body())
            .context("Couldn't write the response body")?;
        Ok(())
    })
}
