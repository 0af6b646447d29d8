/*
 * request.rs
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

//! HTTP request value: method, target host, path + query, headers, body.
//!
//! Built by [`parse_url`](crate::url::parse_url) or by hand via
//! [`Request::new`] and the pub fields; sending is done by the drivers in
//! [`client`](crate::http::client).

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncRead;

use crate::net::CertCheck;
use crate::url::encode_component;

/// Factory for a request body stream. Called once per send; the redirect
/// driver calls it again when a request is replayed, so it must yield a
/// fresh reader every time.
pub type BodyProducer = Arc<dyn Fn() -> Pin<Box<dyn AsyncRead + Send>> + Send + Sync>;

/// Request body: fully-known bytes, or a replayable stream with a declared
/// content length.
#[derive(Clone)]
pub enum RequestBody {
    Bytes(Bytes),
    Stream { length: u64, producer: BodyProducer },
}

impl RequestBody {
    pub fn empty() -> Self {
        RequestBody::Bytes(Bytes::new())
    }

    /// Declared content length, sent in the generated Content-Length header.
    pub fn content_length(&self) -> u64 {
        match self {
            RequestBody::Bytes(b) => b.len() as u64,
            RequestBody::Stream { length, .. } => *length,
        }
    }
}

/// An HTTP request. Headers are kept in insertion order; names compare
/// case-insensitively per HTTP. `Host`, `Content-Length`, and
/// `Accept-Encoding` are generated at send time and must not appear in
/// `headers`.
#[derive(Clone)]
pub struct Request {
    pub method: String,
    pub secure: bool,
    pub host: String,
    pub port: u16,
    /// Percent-encoded; a leading `/` is supplied at send time if missing.
    pub path: String,
    /// Ordered pairs; a `None` value renders as the bare name.
    /// Percent-encoded at send time.
    pub query: Vec<(String, Option<String>)>,
    pub headers: Vec<(String, String)>,
    /// Certificate policy, consulted only when `secure`.
    pub check_certs: CertCheck,
    pub body: RequestBody,
}

impl Request {
    /// A GET for `/` on port 80, plaintext, with no headers and an empty
    /// body.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            secure: false,
            host: host.into(),
            port: 80,
            path: "/".to_string(),
            query: Vec::new(),
            headers: Vec::new(),
            check_certs: CertCheck::accept_all(),
            body: RequestBody::empty(),
        }
    }

    /// Append a header. No replacement: HTTP permits repeated names.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Turn `request` into a form POST: body becomes `k1=v1&k2=v2...` with keys
/// and values percent-encoded (a pair with an empty value emits the key
/// alone), any prior Content-Type header is removed, and
/// `Content-Type: application/x-www-form-urlencoded` is prepended.
pub fn url_encoded_body(pairs: &[(&str, &str)], mut request: Request) -> Request {
    let mut body = String::new();
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            body.push('&');
        }
        body.push_str(&encode_component(name));
        if !value.is_empty() {
            body.push('=');
            body.push_str(&encode_component(value));
        }
    }
    request.method = "POST".to_string();
    request.body = RequestBody::Bytes(Bytes::from(body));
    request
        .headers
        .retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
    request.headers.insert(
        0,
        (
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ),
    );
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_bytes(request: &Request) -> &[u8] {
        match &request.body {
            RequestBody::Bytes(b) => b,
            RequestBody::Stream { .. } => panic!("expected bytes body"),
        }
    }

    #[test]
    fn form_body_encoding() {
        let request = url_encoded_body(&[("a", "1"), ("b c", "& ")], Request::new("h"));
        assert_eq!(body_bytes(&request), b"a=1&b%20c=%26%20");
        assert_eq!(request.method, "POST");
        assert_eq!(
            request.headers[0],
            (
                "Content-Type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )
        );
    }

    #[test]
    fn form_body_empty_value_emits_key_alone() {
        let request = url_encoded_body(&[("k", ""), ("x", "1")], Request::new("h"));
        assert_eq!(body_bytes(&request), b"k&x=1");
    }

    #[test]
    fn form_body_replaces_content_type() {
        let mut request = Request::new("h");
        request.header("Content-Type", "text/plain");
        request.header("X-Other", "1");
        let request = url_encoded_body(&[("a", "b")], request);
        let content_types: Vec<_> = request
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(content_types[0].1, "application/x-www-form-urlencoded");
        assert!(request.headers.iter().any(|(name, _)| name == "X-Other"));
    }

    #[test]
    fn content_length_of_bodies() {
        assert_eq!(RequestBody::empty().content_length(), 0);
        assert_eq!(RequestBody::Bytes(Bytes::from_static(b"abc")).content_length(), 3);
        let stream = RequestBody::Stream {
            length: 42,
            producer: Arc::new(|| -> Pin<Box<dyn AsyncRead + Send>> {
                Box::pin(std::io::Cursor::new(Vec::<u8>::new()))
            }),
        };
        assert_eq!(stream.content_length(), 42);
    }
}
