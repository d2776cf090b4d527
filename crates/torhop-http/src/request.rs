//! Helper functions for preparing and serializing requests.

use crate::{Error, Result};

use torhop_conn::TargetAddr;

/// Figure out the TargetAddr a request should be sent to, from its
/// URI.
///
/// If the URI names no port, the scheme picks one: 443 for https,
/// and 80 otherwise.
pub(crate) fn target_of(req: &http::Request<Vec<u8>>) -> Result<TargetAddr> {
    let uri = req.uri();
    let host = uri.host().ok_or(Error::MissingHost)?;
    // An IPv6 literal in a URI keeps its brackets; TargetAddr wants
    // it bare.
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    let port = uri.port_u16().unwrap_or_else(|| {
        if uri.scheme() == Some(&http::uri::Scheme::HTTPS) {
            443
        } else {
            80
        }
    });
    Ok(TargetAddr::new(host, port)?)
}

/// Fill in the Host and Content-Length headers, if the caller didn't.
pub(crate) fn add_missing_headers(req: &mut http::Request<Vec<u8>>) {
    if !req.headers().contains_key(http::header::HOST) {
        let host = match (req.uri().host(), req.uri().port_u16()) {
            (Some(host), Some(port)) => Some(format!("{}:{}", host, port)),
            (Some(host), None) => Some(host.to_string()),
            (None, _) => None,
        };
        if let Some(host) = host {
            let value = http::HeaderValue::from_str(&host)
                .expect("URI host wasn't a valid header value!");
            req.headers_mut().insert(http::header::HOST, value);
        }
    }
    if !req.body().is_empty() && !req.headers().contains_key(http::header::CONTENT_LENGTH) {
        let len = req.body().len();
        req.headers_mut()
            .insert(http::header::CONTENT_LENGTH, len.into());
    }
}

/// Encode a request in a quick and dirty HTTP 1.0 format.
pub(crate) fn encode_request(req: &http::Request<Vec<u8>>) -> Vec<u8> {
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let mut s = format!("{} {} HTTP/1.0\r\n", req.method(), path);

    for (key, val) in req.headers().iter() {
        s.push_str(&format!(
            "{}: {}\r\n",
            key,
            val.to_str()
                .expect("Added an HTTP header that wasn't UTF-8!")
        ));
    }
    s.push_str("\r\n");

    let mut encoded = s.into_bytes();
    encoded.extend_from_slice(req.body());
    encoded
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn format() {
        let req = http::Request::builder()
            .method("GET")
            .uri("/index.html")
            .body(Vec::new())
            .unwrap();
        assert_eq!(encode_request(&req), b"GET /index.html HTTP/1.0\r\n\r\n");
        let req = http::Request::builder()
            .method("GET")
            .uri("/index.html")
            .header("X-Marsupial", "Opossum")
            .body(Vec::new())
            .unwrap();
        assert_eq!(
            encode_request(&req),
            &b"GET /index.html HTTP/1.0\r\nx-marsupial: Opossum\r\n\r\n"[..]
        );
    }

    #[test]
    fn format_with_body() {
        let mut req = http::Request::builder()
            .method("POST")
            .uri("http://example.com/submit")
            .body(b"hello".to_vec())
            .unwrap();
        add_missing_headers(&mut req);
        let encoded = encode_request(&req);
        let encoded = std::str::from_utf8(&encoded).unwrap();
        assert!(encoded.starts_with("POST /submit HTTP/1.0\r\n"));
        assert!(encoded.contains("host: example.com\r\n"));
        assert!(encoded.contains("content-length: 5\r\n"));
        assert!(encoded.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn target() {
        let req = http::Request::builder()
            .uri("https://www.example.com/doc")
            .body(Vec::new())
            .unwrap();
        let t = target_of(&req).unwrap();
        assert_eq!(t.to_string(), "www.example.com:443");

        let req = http::Request::builder()
            .uri("http://www.example.com/doc")
            .body(Vec::new())
            .unwrap();
        let t = target_of(&req).unwrap();
        assert_eq!(t.to_string(), "www.example.com:80");

        let req = http::Request::builder()
            .uri("http://www.example.com:8080/doc")
            .body(Vec::new())
            .unwrap();
        let t = target_of(&req).unwrap();
        assert_eq!(t.to_string(), "www.example.com:8080");

        let req = http::Request::builder()
            .uri("/doc")
            .body(Vec::new())
            .unwrap();
        assert!(matches!(target_of(&req), Err(Error::MissingHost)));
    }

    #[test]
    fn target_v6() {
        let req = http::Request::builder()
            .uri("http://[2001:db8::1]:8080/doc")
            .body(Vec::new())
            .unwrap();
        let t = target_of(&req).unwrap();
        assert_eq!(t.to_string(), "[2001:db8::1]:8080");
    }
}
