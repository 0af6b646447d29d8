/*
 * lib.rs
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

//! Staffetta: a client-side HTTP/1.1 transfer engine.
//!
//! One call does one request: borrow a keep-alive connection from a shared
//! [`Manager`], send, and stream the decoded response body (chunked framing
//! and gzip peeled off incrementally) into a [`ResponseHandler`] in bounded
//! memory. Idle connections are pooled per `(host, port, secure)` origin;
//! [`http_redirect`] replays rewritten requests for 3xx responses up to a
//! fixed budget.
//!
//! ```no_run
//! # async fn run() -> Result<(), staffetta_core::HttpError> {
//! let body = staffetta_core::simple_http("http://example.com/").await?;
//! println!("{} bytes", body.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod http;
pub mod net;
pub mod url;

pub use error::HttpError;
pub use http::{
    http, http_collect, http_collect_redirect, http_redirect, simple_http, url_encoded_body,
    Collect, Manager, Request, RequestBody, Response, ResponseHandler,
};
pub use http::{with_manager, BodyProducer};
pub use net::{CertCheck, CertPredicate};
pub use url::parse_url;
