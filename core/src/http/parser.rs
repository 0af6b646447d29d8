/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, then body framed by
//! Content-Length, chunked transfer coding, or connection close.
//!
//! Feed bytes via `receive`; events fire as complete tokens are parsed and
//! partial data stays in the buffer. After the zero-size chunk the parser
//! consumes one buffered CRLF and reports a clean boundary; real trailer
//! headers are left unread (the connection then cannot be pooled).

use std::io;

use bytes::{Buf, BytesMut};

use crate::error::HttpError;

/// Callback for response events. The connection bridges these to the
/// user's handler.
pub(crate) trait ParseEvents {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
}

/// Body framing selected from the response headers. Chunked takes
/// precedence over Content-Length when both are present.
pub(crate) enum Framing {
    Chunked,
    Length(u64),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ParseState {
    StatusLine,
    Headers,
    /// Headers done; the connection must call `set_body_mode` (or skip the
    /// body entirely for HEAD).
    HeadersComplete,
    /// Content-Length (counted by `remaining`) or close-delimited body.
    Body,
    ChunkSize,
    ChunkData,
    /// CRLF after a chunk's data bytes.
    ChunkDataEnd,
    /// CRLF after the zero-size chunk.
    ChunkFinish,
    Complete,
}

pub(crate) struct ResponseParser {
    state: ParseState,
    /// Bytes left in the current chunk or Content-Length body.
    remaining: u64,
    close_delimited: bool,
    /// True when the body ended exactly at a response boundary.
    clean: bool,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            remaining: 0,
            close_delimited: false,
            clean: false,
        }
    }

    pub fn headers_complete(&self) -> bool {
        self.state == ParseState::HeadersComplete
    }

    pub fn is_complete(&self) -> bool {
        self.state == ParseState::Complete
    }

    /// True only when the body ended at a response boundary with no framing
    /// residue. The connection additionally requires an empty read buffer
    /// before pooling.
    pub fn clean_boundary(&self) -> bool {
        self.state == ParseState::Complete && self.clean
    }

    /// Find CRLF; returns the offset of the CR, or None if not buffered yet.
    fn find_crlf(buf: &[u8]) -> Option<usize> {
        buf.windows(2).position(|w| w == b"\r\n")
    }

    /// Consume and parse as much as possible. Events fire for each complete
    /// token; partial data remains in `buf`.
    pub fn receive(
        &mut self,
        buf: &mut BytesMut,
        events: &mut dyn ParseEvents,
    ) -> Result<(), HttpError> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| HttpError::Parser("Status line"))?;
                    // HTTP/1.1 200 OK (reason phrase optional)
                    let mut parts = line_str.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    if !version.starts_with("HTTP/") {
                        return Err(HttpError::Parser("Status line"));
                    }
                    let code = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .ok_or(HttpError::Parser("Status line"))?;
                    events.status(code, parts.next());
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    if line_end == 0 {
                        buf.advance(2);
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    let line = buf.split_to(line_end + 2);
                    let line_str = std::str::from_utf8(&line[..line_end])
                        .map_err(|_| HttpError::Parser("Header"))?;
                    let colon = line_str.find(':').ok_or(HttpError::Parser("Header"))?;
                    events.header(line_str[..colon].trim(), line_str[colon + 1..].trim());
                }
                ParseState::HeadersComplete | ParseState::Complete => return Ok(()),
                ParseState::Body => {
                    if self.close_delimited {
                        let chunk = buf.split_to(buf.len());
                        events.body_chunk(&chunk);
                        return Ok(());
                    }
                    let to_read = (self.remaining as usize).min(buf.len());
                    let chunk = buf.split_to(to_read);
                    events.body_chunk(&chunk);
                    self.remaining -= to_read as u64;
                    if self.remaining == 0 {
                        self.clean = true;
                        self.state = ParseState::Complete;
                    }
                }
                ParseState::ChunkSize => {
                    let line_end = match Self::find_crlf(buf) {
                        Some(n) => n,
                        None => return Ok(()),
                    };
                    let line = buf.split_to(line_end + 2);
                    let digits = line[..line_end]
                        .iter()
                        .take_while(|b| b.is_ascii_hexdigit())
                        .count();
                    if digits == 0 {
                        return Err(HttpError::Parser("Chunk header"));
                    }
                    // Anything after the hex size (chunk extensions) is ignored.
                    let size_str = std::str::from_utf8(&line[..digits])
                        .map_err(|_| HttpError::Parser("Chunk header"))?;
                    let size = u64::from_str_radix(size_str, 16)
                        .map_err(|_| HttpError::Parser("Chunk header"))?;
                    if size == 0 {
                        self.state = ParseState::ChunkFinish;
                    } else {
                        self.remaining = size;
                        self.state = ParseState::ChunkData;
                    }
                }
                ParseState::ChunkData => {
                    let to_read = (self.remaining as usize).min(buf.len());
                    let chunk = buf.split_to(to_read);
                    events.body_chunk(&chunk);
                    self.remaining -= to_read as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(HttpError::Parser("End of chunk newline"));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkFinish => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] == b"\r\n" {
                        buf.advance(2);
                        self.clean = true;
                    }
                    // Trailer headers stay in the buffer; the body is done
                    // either way, but the boundary is dirty.
                    self.state = ParseState::Complete;
                }
            }
        }
        Ok(())
    }

    /// Select body framing once headers are in. Content-Length 0 completes
    /// immediately at a clean boundary.
    pub fn set_body_mode(&mut self, framing: &Framing) {
        if self.state != ParseState::HeadersComplete {
            return;
        }
        match framing {
            Framing::Chunked => self.state = ParseState::ChunkSize,
            Framing::Length(0) => {
                self.clean = true;
                self.state = ParseState::Complete;
            }
            Framing::Length(n) => {
                self.remaining = *n;
                self.state = ParseState::Body;
            }
            Framing::Close => {
                self.close_delimited = true;
                self.state = ParseState::Body;
            }
        }
    }

    /// The peer closed the connection. Close-delimited bodies and a missing
    /// final chunk CRLF end here; anywhere else mid-body is an error.
    pub fn finish_at_eof(&mut self) -> Result<(), HttpError> {
        match self.state {
            ParseState::Complete => Ok(()),
            ParseState::Body if self.close_delimited => {
                self.state = ParseState::Complete;
                Ok(())
            }
            ParseState::ChunkFinish => {
                self.state = ParseState::Complete;
                Ok(())
            }
            _ => Err(HttpError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "HTTP connection closed",
            ))),
        }
    }
}
