/*
 * error.rs
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

//! Request errors. Transport errors pass through as `Io` unwrapped.

use std::fmt;
use std::io;

use bytes::Bytes;

/// Errors from URL parsing, the wire protocol, or the redirect driver.
///
/// Any error aborts the current request and forfeits its connection (the
/// socket is closed, never returned to the pool).
#[derive(Debug)]
pub enum HttpError {
    /// URL did not parse; `reason` names the failing rule.
    InvalidUrl { url: String, reason: &'static str },
    /// Malformed status line, header, chunk header, or chunk newline.
    Parser(&'static str),
    /// Redirect budget exhausted while the server kept answering 3xx.
    TooManyRedirects,
    /// Non-2xx final status from `simple_http`, with the collected body.
    StatusCode { code: u16, body: Bytes },
    /// Socket or TLS error from the transport layer.
    Io(io::Error),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::InvalidUrl { url, reason } => write!(f, "invalid URL {}: {}", url, reason),
            HttpError::Parser(context) => write!(f, "HTTP parse error: {}", context),
            HttpError::TooManyRedirects => write!(f, "too many redirects"),
            HttpError::StatusCode { code, .. } => write!(f, "unexpected status code {}", code),
            HttpError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HttpError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        HttpError::Io(e)
    }
}
