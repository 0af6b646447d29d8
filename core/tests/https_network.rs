/*
 * https_network.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * Live-network test for the HTTPS path: TLS handshake, request
 * serialization, response decoding, and the redirect driver against a real
 * origin.
 *
 * Run with:
 *   cargo test -p staffetta_core --test https_network -- --ignored --nocapture
 */

use staffetta_core::{parse_url, simple_http, with_manager, CertCheck, Manager};

#[tokio::test]
#[ignore] // requires network
async fn get_over_https() {
    let body = simple_http("https://example.com/").await.expect("request failed");
    println!("fetched {} bytes", body.len());
    assert!(!body.is_empty());
    let text = String::from_utf8_lossy(&body);
    assert!(text.contains("<html"), "body should be an HTML page");
}

#[tokio::test]
#[ignore] // requires network
async fn https_with_trust_roots() {
    let mut request = parse_url("https://example.com/").unwrap();
    request.check_certs = CertCheck::trust_roots();
    let response = with_manager(|manager: std::sync::Arc<Manager>| async move {
        staffetta_core::http_collect(&request, &manager).await
    })
    .await
    .expect("request failed");
    assert_eq!(response.code, 200);
    assert!(!response.body.is_empty());
}
