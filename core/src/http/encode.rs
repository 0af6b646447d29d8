/*
 * encode.rs
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

//! Request head serialization. Host, Content-Length, and Accept-Encoding
//! are generated here, in that order, ahead of the user headers; the
//! encoder does not deduplicate against user-supplied copies (caller
//! precondition: don't supply them).

use crate::http::request::Request;
use crate::url::encode_component;

/// Serialize the request line and headers, through the blank line. Body
/// bytes are written separately by the connection.
pub(crate) fn encode_head(request: &Request) -> Vec<u8> {
    let mut head = Vec::with_capacity(256);
    head.extend_from_slice(request.method.as_bytes());
    head.push(b' ');
    if !request.path.starts_with('/') {
        head.push(b'/');
    }
    head.extend_from_slice(request.path.as_bytes());
    if !request.query.is_empty() {
        head.push(b'?');
        for (i, (name, value)) in request.query.iter().enumerate() {
            if i > 0 {
                head.push(b'&');
            }
            head.extend_from_slice(encode_component(name).as_bytes());
            if let Some(value) = value {
                head.push(b'=');
                head.extend_from_slice(encode_component(value).as_bytes());
            }
        }
    }
    head.extend_from_slice(b" HTTP/1.1\r\n");

    head.extend_from_slice(b"Host: ");
    head.extend_from_slice(request.host.as_bytes());
    let default_port = if request.secure { 443 } else { 80 };
    if request.port != default_port {
        head.extend_from_slice(format!(":{}", request.port).as_bytes());
    }
    head.extend_from_slice(b"\r\n");

    head.extend_from_slice(
        format!("Content-Length: {}\r\n", request.body.content_length()).as_bytes(),
    );
    head.extend_from_slice(b"Accept-Encoding: gzip\r\n");

    for (name, value) in &request.headers {
        head.extend_from_slice(name.as_bytes());
        head.extend_from_slice(b": ");
        head.extend_from_slice(value.as_bytes());
        head.extend_from_slice(b"\r\n");
    }
    head.extend_from_slice(b"\r\n");
    head
}
