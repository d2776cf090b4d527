//! Read and parse HTTP/1.0 responses.

use crate::{Error, Result};

use futures::io::{AsyncRead, AsyncReadExt};
use tracing::info;

/// Largest response body we're willing to buffer.
const MAX_RESPONSE_LEN: usize = 10 * 1024 * 1024;
/// Largest header block we're willing to buffer.
const MAX_HEADERS_LEN: usize = 16384;

/// Read a whole HTTP response from `stream`.
///
/// The body ends where Content-Length says it does or, absent that
/// header, at EOF: this is HTTP/1.0 with one response per connection.
pub(crate) async fn read_response<S>(mut stream: S) -> Result<http::Response<Vec<u8>>>
where
    S: AsyncRead + Unpin,
{
    let mut buf = vec![0_u8; 1024];
    let mut n_in_buf = 0;

    loop {
        let n = stream.read(&mut buf[n_in_buf..]).await?;
        n_in_buf += n;

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut response = httparse::Response::new(&mut headers);
        let res = response.parse(&buf[..n_in_buf])?;

        if res.is_partial() {
            // We didn't get whole headers; we may need to try again.
            if n == 0 {
                return Err(Error::TruncatedHeaders);
            }
            if n_in_buf >= buf.len() - 500 {
                // The buffer is nearly full; let it grow, up to a point.
                if buf.len() >= MAX_HEADERS_LEN {
                    return Err(httparse::Error::TooManyHeaders.into());
                }
                buf.resize(buf.len() * 2, 0_u8);
            }
        } else {
            let code = response.code.ok_or(Error::TruncatedHeaders)?;
            let mut builder = http::Response::builder().status(code);
            let mut content_length = None;
            for h in response.headers.iter() {
                if h.name.eq_ignore_ascii_case("content-length") {
                    content_length = std::str::from_utf8(h.value)
                        .ok()
                        .and_then(|v| v.trim().parse::<usize>().ok());
                }
                builder = builder.header(h.name, h.value);
            }

            // Whatever followed the headers is the start of the body.
            let n_parsed = res.unwrap();
            buf.copy_within(n_parsed..n_in_buf, 0);
            buf.truncate(n_in_buf - n_parsed);

            let body = read_body(&mut stream, buf, content_length).await?;
            return Ok(builder.body(body)?);
        }
    }
}

/// Read the rest of a response body into `body`, which already holds
/// whatever arrived together with the headers.
async fn read_body<S>(
    stream: &mut S,
    mut body: Vec<u8>,
    content_length: Option<usize>,
) -> Result<Vec<u8>>
where
    S: AsyncRead + Unpin,
{
    if let Some(len) = content_length {
        if len > MAX_RESPONSE_LEN {
            return Err(Error::ResponseTooLong(len));
        }
    }

    let mut chunk = [0_u8; 2048];
    loop {
        if let Some(len) = content_length {
            if body.len() >= len {
                body.truncate(len);
                return Ok(body);
            }
        }
        if body.len() > MAX_RESPONSE_LEN {
            return Err(Error::ResponseTooLong(body.len()));
        }

        let n = stream.read(&mut chunk[..]).await?;
        if n == 0 {
            if let Some(len) = content_length {
                // Tolerate a short body: HTTP/1.0 servers sometimes
                // hang up early, and a partial document beats none.
                info!(
                    "Connection closed after {} of {} declared body bytes",
                    body.len(),
                    len
                );
            }
            return Ok(body);
        }
        body.extend_from_slice(&chunk[..n]);
    }
}
