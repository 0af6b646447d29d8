/*
 * url.rs
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

//! URL parsing and percent-encoding. `parse_url` turns an `http://` or
//! `https://` string into a default [`Request`]; non-ASCII input is accepted
//! by encoding its UTF-8 bytes. Fragments are discarded.

use crate::error::HttpError;
use crate::http::Request;

/// RFC 3986 unreserved set: these bytes pass through unencoded.
fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~')
}

fn push_pct(out: &mut String, b: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    out.push('%');
    out.push(HEX[(b >> 4) as usize] as char);
    out.push(HEX[(b & 0x0f) as usize] as char);
}

/// Percent-encode one URL component (query name/value, form key/value).
/// Everything outside the unreserved set becomes `%HH` with uppercase hex.
pub(crate) fn encode_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            push_pct(&mut out, b);
        }
    }
    out
}

/// Percent-encode a path, preserving `/` separators.
pub(crate) fn encode_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if is_unreserved(b) || b == b'/' {
            out.push(b as char);
        } else {
            push_pct(&mut out, b);
        }
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode `%HH` escapes and `+`-as-space. Malformed escapes pass through.
fn decode_component(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse `name[=value][&...]` into ordered pairs, decoding each part.
fn parse_query(raw: &str) -> Vec<(String, Option<String>)> {
    raw.split('&')
        .filter(|seg| !seg.is_empty())
        .map(|seg| match seg.split_once('=') {
            Some((name, value)) => (decode_component(name), Some(decode_component(value))),
            None => (decode_component(seg), None),
        })
        .collect()
}

/// Parse a URL into a request with defaults: method GET, no headers, empty
/// body, accept-all certificate check. The scheme match is case-sensitive.
pub fn parse_url(url: &str) -> Result<Request, HttpError> {
    let (secure, rest) = if let Some(rest) = url.strip_prefix("http://") {
        (false, rest)
    } else if let Some(rest) = url.strip_prefix("https://") {
        (true, rest)
    } else {
        return Err(HttpError::InvalidUrl {
            url: url.to_string(),
            reason: "Invalid scheme",
        });
    };

    let (authority, path_and_query) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };

    let (host, port) = match authority.split_once(':') {
        Some((host, port_str)) => {
            let port = match port_str.parse::<u16>() {
                Ok(p) if p != 0 => p,
                _ => {
                    return Err(HttpError::InvalidUrl {
                        url: url.to_string(),
                        reason: "Invalid port",
                    })
                }
            };
            (host, port)
        }
        None => (authority, if secure { 443 } else { 80 }),
    };

    // Fragment is dropped; query sits between '?' and '#'.
    let without_fragment = match path_and_query.find('#') {
        Some(i) => &path_and_query[..i],
        None => path_and_query,
    };
    let (raw_path, raw_query) = match without_fragment.find('?') {
        Some(i) => (&without_fragment[..i], &without_fragment[i + 1..]),
        None => (without_fragment, ""),
    };

    let path = if raw_path.is_empty() {
        "/".to_string()
    } else {
        encode_path(raw_path)
    };

    let mut request = Request::new(host);
    request.secure = secure;
    request.port = port;
    request.path = path;
    request.query = parse_query(raw_query);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_url_defaults() {
        let r = parse_url("http://example.com/").unwrap();
        assert_eq!(r.host, "example.com");
        assert_eq!(r.port, 80);
        assert_eq!(r.path, "/");
        assert_eq!(r.method, "GET");
        assert!(!r.secure);
        assert!(r.query.is_empty());
        assert!(r.headers.is_empty());
    }

    #[test]
    fn secure_url_with_port_space_and_fragment() {
        let r = parse_url("https://example.com:8443/a b?x=1&y=2#frag").unwrap();
        assert!(r.secure);
        assert_eq!(r.port, 8443);
        assert_eq!(r.path, "/a%20b");
        assert_eq!(
            r.query,
            vec![
                ("x".to_string(), Some("1".to_string())),
                ("y".to_string(), Some("2".to_string())),
            ]
        );
    }

    #[test]
    fn missing_path_becomes_root() {
        let r = parse_url("http://example.com").unwrap();
        assert_eq!(r.path, "/");
        let r = parse_url("https://example.com:8080").unwrap();
        assert_eq!(r.path, "/");
        assert_eq!(r.port, 8080);
    }

    #[test]
    fn default_port_tracks_scheme() {
        assert_eq!(parse_url("http://h/").unwrap().port, 80);
        assert_eq!(parse_url("https://h/").unwrap().port, 443);
    }

    #[test]
    fn scheme_is_case_sensitive() {
        for url in ["ftp://example.com/", "HTTP://example.com/", "example.com"] {
            match parse_url(url) {
                Err(HttpError::InvalidUrl { reason, .. }) => assert_eq!(reason, "Invalid scheme"),
                other => panic!("expected InvalidUrl, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn bad_port_is_rejected() {
        for url in ["http://h:99999/", "http://h:x/", "http://h:/", "http://h:0/"] {
            match parse_url(url) {
                Err(HttpError::InvalidUrl { reason, .. }) => assert_eq!(reason, "Invalid port"),
                other => panic!("expected InvalidUrl, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn valueless_query_key() {
        let r = parse_url("http://h/p?flag&x=1").unwrap();
        assert_eq!(
            r.query,
            vec![
                ("flag".to_string(), None),
                ("x".to_string(), Some("1".to_string())),
            ]
        );
    }

    #[test]
    fn query_decodes_plus_and_percent() {
        let r = parse_url("http://h/p?q=a+b&r=%26%20").unwrap();
        assert_eq!(
            r.query,
            vec![
                ("q".to_string(), Some("a b".to_string())),
                ("r".to_string(), Some("& ".to_string())),
            ]
        );
    }

    #[test]
    fn non_ascii_path_is_utf8_encoded() {
        let r = parse_url("http://h/caf\u{e9}").unwrap();
        assert_eq!(r.path, "/caf%C3%A9");
    }

    #[test]
    fn encode_component_table() {
        assert_eq!(encode_component("AZaz09-_.~"), "AZaz09-_.~");
        assert_eq!(encode_component("a b"), "a%20b");
        assert_eq!(encode_component("&/?"), "%26%2F%3F");
        assert_eq!(encode_path("/a b/c"), "/a%20b/c");
    }
}
