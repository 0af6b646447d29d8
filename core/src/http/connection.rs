/*
 * connection.rs
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

//! One HTTP connection: a TCP or TLS stream plus its read buffer. Writes a
//! serialized request, drives the push parser to end of headers, then
//! streams the framed (and optionally gzipped) body into a sink.
//!
//! A connection is fit for pooling only when the body ended at a clean
//! response boundary and nothing is left in the read buffer.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::HttpError;
use crate::http::encode::encode_head;
use crate::http::gzip::GzipStage;
use crate::http::parser::{Framing, ParseEvents, ResponseParser};
use crate::http::request::{Request, RequestBody};
use crate::net::{open_stream, CertCheck, HttpStream};

const READ_CHUNK: usize = 8192;

/// Sink for decoded body bytes. The client bridges this to the user's
/// handler; the redirect driver uses a discarding sink to drain 3xx bodies.
pub(crate) trait BodySink {
    fn chunk(&mut self, data: &[u8]);
}

pub(crate) struct Discard;

impl BodySink for Discard {
    fn chunk(&mut self, _data: &[u8]) {}
}

/// Captures status and headers while the head is parsed.
#[derive(Default)]
struct HeadCollector {
    code: Option<u16>,
    headers: Vec<(String, String)>,
}

impl ParseEvents for HeadCollector {
    fn status(&mut self, code: u16, _reason: Option<&str>) {
        self.code = Some(code);
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, _data: &[u8]) {}
}

/// Routes parsed body bytes through the optional gzip stage into the sink.
/// Inflate errors are held and surfaced after the parser call returns.
struct BodyForward<'a> {
    gzip: Option<GzipStage>,
    sink: &'a mut dyn BodySink,
    failed: Option<io::Error>,
}

impl ParseEvents for BodyForward<'_> {
    fn status(&mut self, _code: u16, _reason: Option<&str>) {}

    fn header(&mut self, _name: &str, _value: &str) {}

    fn body_chunk(&mut self, data: &[u8]) {
        if self.failed.is_some() {
            return;
        }
        match &mut self.gzip {
            Some(stage) => {
                let sink = &mut *self.sink;
                if let Err(e) = stage.push(data, &mut |d| sink.chunk(d)) {
                    self.failed = Some(e);
                }
            }
            None => self.sink.chunk(data),
        }
    }
}

pub struct HttpConnection {
    stream: HttpStream,
    read_buf: BytesMut,
}

impl HttpConnection {
    pub(crate) fn new(stream: HttpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }

    pub(crate) async fn open(
        host: &str,
        port: u16,
        secure: bool,
        check: &CertCheck,
    ) -> Result<Self, HttpError> {
        Ok(Self::new(open_stream(host, port, secure, check).await?))
    }

    /// Bytes past the response boundary (pipelined or trailer residue).
    pub(crate) fn has_residue(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Serialize and send the request: head, then body. A `Stream` body is
    /// pumped from a fresh producer without intermediate buffering.
    pub(crate) async fn write_request(&mut self, request: &Request) -> Result<(), HttpError> {
        let head = encode_head(request);
        self.stream.write_all(&head).await?;
        match &request.body {
            RequestBody::Bytes(body) => {
                if !body.is_empty() {
                    self.stream.write_all(body).await?;
                }
            }
            RequestBody::Stream { producer, .. } => {
                let mut reader = (**producer)();
                let mut buf = [0u8; READ_CHUNK];
                loop {
                    let n = reader.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    self.stream.write_all(&buf[..n]).await?;
                }
            }
        }
        self.stream.flush().await?;
        Ok(())
    }

    /// Drive the parser to end of headers; returns status code and headers
    /// in wire order. Body bytes read past the head stay buffered.
    pub(crate) async fn read_head(
        &mut self,
        parser: &mut ResponseParser,
    ) -> Result<(u16, Vec<(String, String)>), HttpError> {
        let mut head = HeadCollector::default();
        loop {
            parser.receive(&mut self.read_buf, &mut head)?;
            if parser.headers_complete() {
                let code = head.code.ok_or(HttpError::Parser("Status line"))?;
                return Ok((code, head.headers));
            }
            let mut buf = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                return Err(HttpError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "HTTP connection closed",
                )));
            }
            self.read_buf.extend_from_slice(&buf[..n]);
        }
    }

    /// Stream the body through the framing decoder (and gzip when present)
    /// into the sink. Returns true when the connection ended at a clean
    /// boundary and may be pooled.
    pub(crate) async fn stream_body(
        &mut self,
        parser: &mut ResponseParser,
        framing: Framing,
        gzipped: bool,
        sink: &mut dyn BodySink,
    ) -> Result<bool, HttpError> {
        parser.set_body_mode(&framing);
        let mut forward = BodyForward {
            gzip: gzipped.then(GzipStage::new),
            sink,
            failed: None,
        };
        loop {
            parser.receive(&mut self.read_buf, &mut forward)?;
            if let Some(e) = forward.failed.take() {
                return Err(HttpError::Io(e));
            }
            if parser.is_complete() {
                break;
            }
            let mut buf = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut buf).await?;
            if n == 0 {
                parser.finish_at_eof()?;
                break;
            }
            self.read_buf.extend_from_slice(&buf[..n]);
        }
        if let Some(stage) = forward.gzip.take() {
            let sink = forward.sink;
            stage
                .finish(&mut |d| sink.chunk(d))
                .map_err(HttpError::Io)?;
        }
        Ok(parser.clean_boundary() && self.read_buf.is_empty())
    }
}
