/*
 * mod.rs
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

//! HTTP/1.1 engine: request values, push-parsed responses, streaming
//! transfer decoders, keep-alive pooling, and the request/redirect drivers.
//!
//! Design:
//! - Callback-based response delivery: [`ResponseHandler`] receives status,
//!   headers, then decoded body chunks in bounded memory.
//! - Buffers: `bytes` crate (`BytesMut` for the parse buffer, `Bytes` for
//!   payloads).
//! - Framing (chunked / Content-Length / close-delimited) is decoded before
//!   gzip, so the inflater always sees post-framing bytes.
//! - A connection goes back to the pool only after its body ended exactly
//!   at a response boundary.

mod client;
mod connection;
mod encode;
mod gzip;
mod handler;
mod parser;
mod pool;
mod request;
mod response;

pub use client::{http, http_collect, http_collect_redirect, http_redirect, simple_http};
pub use connection::HttpConnection;
pub use handler::{Collect, ResponseHandler};
pub use pool::{with_manager, Manager};
pub use request::{url_encoded_body, BodyProducer, Request, RequestBody};
pub use response::Response;
