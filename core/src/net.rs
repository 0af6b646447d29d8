/*
 * net.rs
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

//! Transport: TCP connect with timeout, optional rustls TLS, unified
//! `HttpStream` (plain or secure) implementing AsyncRead + AsyncWrite.
//! Certificate acceptance is controlled per request by [`CertCheck`].

use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;
use tokio_rustls::rustls;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::client::WebPkiServerVerifier;
use tokio_rustls::rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tokio_rustls::TlsConnector;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Caller predicate over the presented certificate chain (end-entity first).
pub type CertPredicate = Arc<dyn Fn(&[CertificateDer<'_>]) -> bool + Send + Sync>;

/// Certificate acceptance policy for secure connections.
///
/// `Predicate` hands the presented chain to a caller function and accepts
/// when it returns true; handshake signatures are still verified.
/// `TrustRoots` performs standard webpki validation against platform
/// native certificates with the Mozilla bundle as fallback.
#[derive(Clone)]
pub enum CertCheck {
    TrustRoots,
    Predicate(CertPredicate),
}

impl CertCheck {
    /// Accept any presented chain. This is the default for parsed URLs.
    pub fn accept_all() -> Self {
        CertCheck::Predicate(Arc::new(|_| true))
    }

    pub fn predicate(f: impl Fn(&[CertificateDer<'_>]) -> bool + Send + Sync + 'static) -> Self {
        CertCheck::Predicate(Arc::new(f))
    }

    pub fn trust_roots() -> Self {
        CertCheck::TrustRoots
    }
}

impl Default for CertCheck {
    fn default() -> Self {
        CertCheck::accept_all()
    }
}

impl fmt::Debug for CertCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertCheck::TrustRoots => f.write_str("CertCheck::TrustRoots"),
            CertCheck::Predicate(_) => f.write_str("CertCheck::Predicate(..)"),
        }
    }
}

/// Build a root certificate store: platform native certs first, then
/// webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    if let Ok(certs) = rustls_native_certs::load_native_certs() {
        for cert in certs {
            let _ = root_store.add(cert);
        }
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

fn default_algorithms() -> WebPkiSupportedAlgorithms {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
        .signature_verification_algorithms
}

/// Verifier that delegates chain acceptance to a caller predicate while
/// keeping handshake signature verification intact.
struct PredicateVerifier {
    check: CertPredicate,
    algorithms: WebPkiSupportedAlgorithms,
}

impl fmt::Debug for PredicateVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PredicateVerifier")
    }
}

impl ServerCertVerifier for PredicateVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let mut chain = Vec::with_capacity(1 + intermediates.len());
        chain.push(end_entity.clone());
        chain.extend(intermediates.iter().cloned());
        if (self.check)(&chain) {
            Ok(ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::InvalidCertificate(
                CertificateError::ApplicationVerificationFailure,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// TLS client config for the given certificate policy. ALPN offers
/// http/1.1 only.
fn client_config(check: &CertCheck) -> io::Result<Arc<ClientConfig>> {
    let mut config = match check {
        CertCheck::TrustRoots => {
            let verifier = WebPkiServerVerifier::builder(Arc::new(build_root_store()))
                .build()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
            ClientConfig::builder()
                .with_webpki_verifier(verifier)
                .with_no_client_auth()
        }
        CertCheck::Predicate(check) => ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(PredicateVerifier {
                check: Arc::clone(check),
                algorithms: default_algorithms(),
            }))
            .with_no_client_auth(),
    };
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

/// Connect to `host:port`, optionally negotiating TLS with the given
/// certificate policy. The resolver supplies candidate addresses; the
/// first that connects wins.
pub(crate) async fn open_stream(
    host: &str,
    port: u16,
    secure: bool,
    check: &CertCheck,
) -> io::Result<HttpStream> {
    let addr = format!("{}:{}", host, port);
    let tcp = timeout(CONNECT_TIMEOUT, TcpStream::connect(&addr))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TCP connect timed out"))??;

    if !secure {
        return Ok(HttpStream::Plain(tcp));
    }

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
    let connector = TlsConnector::from(client_config(check)?);
    let tls = connector.connect(server_name, tcp).await?;
    Ok(HttpStream::Tls(Box::new(tls)))
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}
