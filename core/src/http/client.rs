/*
 * client.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Staffetta, a client-side HTTP transfer engine.
 *
 * Staffetta is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Staffetta is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Staffetta.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Request drivers. [`http`] performs one exchange: borrow a connection,
//! send, parse, stream the decoded body into the handler, and return the
//! connection to the pool when it ends at a clean boundary. [`http_redirect`]
//! wraps it, replaying rewritten requests for 3xx responses up to a budget
//! of 10; a 303 coerces the follow-up to a bodiless GET.
//!
//! Errors forfeit the connection: it is dropped, never pooled.

use bytes::Bytes;

use crate::error::HttpError;
use crate::http::connection::{BodySink, Discard, HttpConnection};
use crate::http::handler::{Collect, ResponseHandler};
use crate::http::parser::{Framing, ResponseParser};
use crate::http::pool::{with_manager, ConnKey, Manager};
use crate::http::request::{Request, RequestBody};
use crate::http::response::Response;
use crate::url::parse_url;

const REDIRECT_LIMIT: u32 = 10;

fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Chunked wins over Content-Length when both are present; an absent or
/// unparseable Content-Length means close-delimited. Header names compare
/// case-insensitively, the trigger values exactly.
fn select_framing(headers: &[(String, String)]) -> Framing {
    if header_value(headers, "transfer-encoding") == Some("chunked") {
        return Framing::Chunked;
    }
    match header_value(headers, "content-length").and_then(|v| v.trim().parse::<u64>().ok()) {
        Some(n) => Framing::Length(n),
        None => Framing::Close,
    }
}

fn is_gzipped(headers: &[(String, String)]) -> bool {
    header_value(headers, "content-encoding") == Some("gzip")
}

struct HandlerSink<'a, H: ResponseHandler> {
    handler: &'a mut H,
}

impl<H: ResponseHandler> BodySink for HandlerSink<'_, H> {
    fn chunk(&mut self, data: &[u8]) {
        self.handler.body_chunk(data);
    }
}

/// Borrow a connection, send the request, and parse through end of headers.
/// On any failure the connection is dropped.
async fn exchange(
    request: &Request,
    manager: &Manager,
) -> Result<(ConnKey, HttpConnection, ResponseParser, u16, Vec<(String, String)>), HttpError> {
    let key = ConnKey::of(request);
    let mut conn = match manager.take(&key) {
        Some(conn) => conn,
        None => {
            HttpConnection::open(&request.host, request.port, request.secure, &request.check_certs)
                .await?
        }
    };
    let mut parser = ResponseParser::new();
    conn.write_request(request).await?;
    let (status, headers) = conn.read_head(&mut parser).await?;
    Ok((key, conn, parser, status, headers))
}

/// Hand the response to the handler, streaming the body through the
/// decoders. HEAD never reads body bytes regardless of the headers.
async fn deliver<H: ResponseHandler>(
    mut conn: HttpConnection,
    mut parser: ResponseParser,
    status: u16,
    headers: Vec<(String, String)>,
    request: &Request,
    mut handler: H,
    manager: &Manager,
    key: ConnKey,
) -> Result<H::Output, HttpError> {
    handler.begin(status, &headers);
    if request.method == "HEAD" {
        if !conn.has_residue() {
            manager.put(key, conn);
        }
        return Ok(handler.finish());
    }
    let framing = select_framing(&headers);
    let gzipped = is_gzipped(&headers);
    let clean = {
        let mut sink = HandlerSink {
            handler: &mut handler,
        };
        conn.stream_body(&mut parser, framing, gzipped, &mut sink)
            .await?
    };
    if clean {
        manager.put(key, conn);
    }
    Ok(handler.finish())
}

/// Perform one request, streaming the decoded body into `handler` and
/// returning its output. Redirects are delivered like any other status.
pub async fn http<H: ResponseHandler>(
    request: &Request,
    handler: H,
    manager: &Manager,
) -> Result<H::Output, HttpError> {
    let (key, conn, parser, status, headers) = exchange(request, manager).await?;
    deliver(conn, parser, status, headers, request, handler, manager, key).await
}

/// Rewrite `current` toward `location`. Relative locations are made
/// absolute against the current origin; the parsed target contributes
/// host, port, scheme, path, and query. A 303 becomes a bodiless GET.
fn redirected_request(
    current: &Request,
    status: u16,
    location: &str,
) -> Result<Request, HttpError> {
    let absolute = if location.starts_with('/') {
        let scheme = if current.secure { "https" } else { "http" };
        format!("{}://{}:{}{}", scheme, current.host, current.port, location)
    } else {
        location.to_string()
    };
    let parsed = parse_url(&absolute)?;
    let mut next = current.clone();
    next.host = parsed.host;
    next.port = parsed.port;
    next.secure = parsed.secure;
    next.path = parsed.path;
    next.query = parsed.query;
    if status == 303 {
        next.method = "GET".to_string();
        next.body = RequestBody::empty();
    }
    Ok(next)
}

/// Like [`http`], but follow 3xx responses carrying a Location header.
/// The 3xx body is drained (pooling the connection when possible) before
/// the rewritten request is replayed.
pub async fn http_redirect<H: ResponseHandler>(
    request: &Request,
    handler: H,
    manager: &Manager,
) -> Result<H::Output, HttpError> {
    let mut current = request.clone();
    let mut budget = REDIRECT_LIMIT;
    loop {
        let (key, mut conn, mut parser, status, headers) = exchange(&current, manager).await?;
        let location = if (300..400).contains(&status) {
            header_value(&headers, "location").map(|v| v.to_string())
        } else {
            None
        };
        let location = match location {
            Some(location) => location,
            None => {
                return deliver(conn, parser, status, headers, &current, handler, manager, key)
                    .await
            }
        };
        if budget == 0 {
            return Err(HttpError::TooManyRedirects);
        }
        if current.method == "HEAD" {
            if !conn.has_residue() {
                manager.put(key, conn);
            }
        } else {
            let framing = select_framing(&headers);
            let clean = conn
                .stream_body(&mut parser, framing, false, &mut Discard)
                .await?;
            if clean {
                manager.put(key, conn);
            }
        }
        current = redirected_request(&current, status, &location)?;
        budget -= 1;
    }
}

/// Perform the request and collect the body in memory.
pub async fn http_collect(request: &Request, manager: &Manager) -> Result<Response, HttpError> {
    http(request, Collect::new(), manager).await
}

/// Follow redirects and collect the final body in memory.
pub async fn http_collect_redirect(
    request: &Request,
    manager: &Manager,
) -> Result<Response, HttpError> {
    http_redirect(request, Collect::new(), manager).await
}

/// Download a URL: parse it, follow redirects through a scoped manager,
/// and return the body bytes. A final status outside 2xx fails with
/// [`HttpError::StatusCode`] carrying the collected body.
pub async fn simple_http(url: &str) -> Result<Bytes, HttpError> {
    let request = parse_url(url)?;
    with_manager(|manager| async move {
        let response = http_collect_redirect(&request, &manager).await?;
        if (200..300).contains(&response.code) {
            Ok(response.body)
        } else {
            Err(HttpError::StatusCode {
                code: response.code,
                body: response.body,
            })
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn chunked_takes_precedence_over_content_length() {
        let hs = headers(&[("Content-Length", "999"), ("Transfer-Encoding", "chunked")]);
        assert!(matches!(select_framing(&hs), Framing::Chunked));
    }

    #[test]
    fn content_length_framing() {
        let hs = headers(&[("content-LENGTH", "42")]);
        assert!(matches!(select_framing(&hs), Framing::Length(42)));
    }

    #[test]
    fn unparseable_content_length_means_close() {
        let hs = headers(&[("Content-Length", "many")]);
        assert!(matches!(select_framing(&hs), Framing::Close));
        assert!(matches!(select_framing(&[]), Framing::Close));
    }

    #[test]
    fn framing_values_match_exactly() {
        // Name case-insensitive, value exact.
        let hs = headers(&[("Transfer-Encoding", "Chunked")]);
        assert!(matches!(select_framing(&hs), Framing::Close));
        assert!(is_gzipped(&headers(&[("CONTENT-ENCODING", "gzip")])));
        assert!(!is_gzipped(&headers(&[("Content-Encoding", "GZIP")])));
        assert!(!is_gzipped(&headers(&[("Content-Encoding", "gzip, br")])));
    }

    #[test]
    fn relative_location_keeps_origin_and_method() {
        let mut current = Request::new("h");
        current.port = 8080;
        current.method = "POST".to_string();
        let next = redirected_request(&current, 302, "/b?x=1").unwrap();
        assert_eq!(next.host, "h");
        assert_eq!(next.port, 8080);
        assert_eq!(next.path, "/b");
        assert_eq!(next.query, vec![("x".to_string(), Some("1".to_string()))]);
        assert_eq!(next.method, "POST");
        assert!(!next.secure);
    }

    #[test]
    fn absolute_location_switches_origin() {
        let mut current = Request::new("h");
        current.header("X-Keep", "1");
        let next = redirected_request(&current, 301, "https://other.example:8443/elsewhere").unwrap();
        assert_eq!(next.host, "other.example");
        assert_eq!(next.port, 8443);
        assert!(next.secure);
        assert_eq!(next.path, "/elsewhere");
        // Headers travel with the request.
        assert_eq!(next.headers, vec![("X-Keep".to_string(), "1".to_string())]);
    }

    #[test]
    fn see_other_coerces_to_bodiless_get() {
        let mut current = Request::new("h");
        current.method = "POST".to_string();
        current.body = RequestBody::Bytes(Bytes::from_static(b"payload"));
        let next = redirected_request(&current, 303, "/x").unwrap();
        assert_eq!(next.method, "GET");
        assert_eq!(next.body.content_length(), 0);
        // Other 3xx statuses preserve both.
        let next = redirected_request(&current, 307, "/x").unwrap();
        assert_eq!(next.method, "POST");
        assert_eq!(next.body.content_length(), 7);
    }

    #[test]
    fn bad_location_surfaces_invalid_url() {
        let current = Request::new("h");
        assert!(matches!(
            redirected_request(&current, 302, "ftp://nope/"),
            Err(HttpError::InvalidUrl { .. })
        ));
    }
}
