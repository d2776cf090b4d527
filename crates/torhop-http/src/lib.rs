//! Make HTTP requests over a proxied transport.
//!
//! This crate sends requests as HTTP/1.0 over a
//! [`Transport`](torhop_conn::Transport) connection: one connection,
//! one request, one response.  That is deliberately minimal — no
//! keep-alive, no chunked encoding, no redirects — but it is enough
//! to talk to an API endpoint or fetch a document through an
//! anonymizing proxy, and it never gives the HTTP layer a chance to
//! resolve a hostname behind the transport's back.
//!
//! Requests and responses use the types from the `http` crate, with
//! `Vec<u8>` bodies.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

mod err;
mod request;
mod response;

use torhop_conn::Transport;

use futures::io::AsyncWriteExt;
use tracing::info;

pub use err::Error;

/// A Result type for the torhop_http crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fetch the resource described by `req` through `transport`.
///
/// The target is taken from the request URI: its hostname goes to the
/// transport unresolved, and its port defaults from the scheme (443
/// for https, 80 otherwise).  Missing Host and Content-Length headers
/// are filled in.
///
/// The response status is returned as data, not as an error; only
/// transport-level and syntax problems fail the call.
pub async fn fetch<TR>(
    transport: &TR,
    mut req: http::Request<Vec<u8>>,
) -> Result<http::Response<Vec<u8>>>
where
    TR: Transport,
{
    let target = request::target_of(&req)?;
    request::add_missing_headers(&mut req);
    let encoded = request::encode_request(&req);

    let mut stream = transport.connect(&target).await?;
    stream.write_all(&encoded[..]).await?;
    stream.flush().await?;
    info!("Request sent to {}; waiting for response", target);

    response::read_response(stream).await
}
