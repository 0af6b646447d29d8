/*
 * pool.rs
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

//! Keep-alive connection pool. Idle connections are keyed by
//! `(host, port, secure)`, at most one per key; borrowing is a destructive
//! take and inserting displaces (closes) any previous holder. All map
//! mutations happen in one short critical section.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::http::connection::HttpConnection;
use crate::http::request::Request;

/// Pool key. Hosts compare byte-exact: no case folding, no DNS-based
/// unification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ConnKey {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

impl ConnKey {
    pub fn of(request: &Request) -> Self {
        Self {
            host: request.host.clone(),
            port: request.port,
            secure: request.secure,
        }
    }
}

/// Owner of idle connections. Create one per logical client, share it
/// across requests, and close it (or use [`with_manager`]) when done.
/// Closing leaves the manager usable, equivalent to fresh.
#[derive(Default)]
pub struct Manager {
    idle: Mutex<HashMap<ConnKey, HttpConnection>>,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the idle connection for `key`, if any.
    pub(crate) fn take(&self, key: &ConnKey) -> Option<HttpConnection> {
        self.idle.lock().unwrap().remove(key)
    }

    /// Park `conn` as idle for `key`. A connection already idle under the
    /// same key is displaced and closed; the newer one is kept.
    pub(crate) fn put(&self, key: ConnKey, conn: HttpConnection) {
        let displaced = self.idle.lock().unwrap().insert(key, conn);
        // Closes after the lock is released.
        drop(displaced);
    }

    /// Close every idle connection. The manager remains usable.
    pub fn close_all(&self) {
        let drained = std::mem::take(&mut *self.idle.lock().unwrap());
        drop(drained);
    }
}

/// Scoped manager: create one, run `f` with it, and close all idle
/// connections on the way out, on success and failure alike.
pub async fn with_manager<T, Fut>(f: impl FnOnce(Arc<Manager>) -> Fut) -> T
where
    Fut: Future<Output = T>,
{
    let manager = Arc::new(Manager::new());
    let result = f(Arc::clone(&manager)).await;
    manager.close_all();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    use crate::net::HttpStream;

    fn key(host: &str) -> ConnKey {
        ConnKey {
            host: host.to_string(),
            port: 80,
            secure: false,
        }
    }

    /// Loopback pair: the client end wrapped as an HttpConnection, plus the
    /// server end for observing closes.
    async fn conn_pair() -> (HttpConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (HttpConnection::new(HttpStream::Plain(client)), server)
    }

    async fn assert_closed(mut server: TcpStream) {
        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn take_is_destructive() {
        let manager = Manager::new();
        let (conn, _server) = conn_pair().await;
        manager.put(key("a"), conn);
        assert!(manager.take(&key("a")).is_some());
        assert!(manager.take(&key("a")).is_none());
    }

    #[tokio::test]
    async fn keys_do_not_alias() {
        let manager = Manager::new();
        let (conn, _server) = conn_pair().await;
        manager.put(key("a"), conn);
        assert!(manager.take(&key("b")).is_none());
        let mut secure = key("a");
        secure.secure = true;
        assert!(manager.take(&secure).is_none());
        assert!(manager.take(&key("a")).is_some());
    }

    #[tokio::test]
    async fn second_insert_displaces_and_closes_first() {
        let manager = Manager::new();
        let (first, first_server) = conn_pair().await;
        let (second, second_server) = conn_pair().await;
        manager.put(key("a"), first);
        manager.put(key("a"), second);
        assert_closed(first_server).await;
        // One idle connection remains, and it is the second one.
        assert!(manager.take(&key("a")).is_some());
        assert!(manager.take(&key("a")).is_none());
        drop(second_server);
    }

    #[tokio::test]
    async fn close_all_closes_and_resets() {
        let manager = Manager::new();
        let (a, a_server) = conn_pair().await;
        let (b, b_server) = conn_pair().await;
        manager.put(key("a"), a);
        manager.put(key("b"), b);
        manager.close_all();
        assert_closed(a_server).await;
        assert_closed(b_server).await;
        assert!(manager.take(&key("a")).is_none());
        // Still usable after close_all.
        let (c, _c_server) = conn_pair().await;
        manager.put(key("c"), c);
        assert!(manager.take(&key("c")).is_some());
    }

    #[tokio::test]
    async fn with_manager_closes_on_both_paths() {
        let (conn, server) = conn_pair().await;
        let outcome: Result<(), ()> = with_manager(|manager| async move {
            manager.put(key("a"), conn);
            Err(())
        })
        .await;
        assert!(outcome.is_err());
        assert_closed(server).await;
    }
}
