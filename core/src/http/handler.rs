/*
 * handler.rs
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

//! Response handler trait (push model). The driver calls `begin` once with
//! the status and headers, `body_chunk` for each decoded chunk as it
//! arrives, and `finish` after the body completes.
//!
//! Body chunks are post-decoding plaintext: chunked framing and gzip have
//! already been peeled off. Chunk data is only valid for the duration of
//! the call, so a handler that keeps it must copy.

use bytes::BytesMut;

use crate::http::response::Response;

pub trait ResponseHandler {
    type Output;

    /// Status and headers, before any body byte.
    fn begin(&mut self, status: u16, headers: &[(String, String)]);

    /// One decoded body chunk. Never called for HEAD requests.
    fn body_chunk(&mut self, data: &[u8]);

    /// Body complete; produce the caller's value.
    fn finish(self) -> Self::Output;
}

/// Default handler: concatenates the body in memory and yields a
/// [`Response`]. The only handler that materializes the body; use a custom
/// handler to stream large transfers in bounded memory.
#[derive(Default)]
pub struct Collect {
    code: u16,
    headers: Vec<(String, String)>,
    body: BytesMut,
}

impl Collect {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseHandler for Collect {
    type Output = Response;

    fn begin(&mut self, status: u16, headers: &[(String, String)]) {
        self.code = status;
        self.headers = headers.to_vec();
    }

    fn body_chunk(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    fn finish(self) -> Response {
        Response {
            code: self.code,
            headers: self.headers,
            body: self.body.freeze(),
        }
    }
}
