#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
#![cfg(feature = "provisioning")]
//! Provisioning tests against a local mock HTTP server.
//!
//! The server is a raw `TcpListener` speaking just enough HTTP/1.1 for one
//! request/response exchange, so the tests pin the exact paths and status
//! handling without any extra test dependencies.

use std::sync::{Arc, Mutex as StdMutex};

use brainlook_client::{BrainlookError, ProvisioningClient};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a mock HTTP server that answers every request with `status` and
/// `body`. Returns the base URL and a log of received request lines.
async fn start_mock_http(status: &'static str, body: &'static str) -> (String, Arc<StdMutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(StdMutex::new(Vec::new()));
    let log = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            let log = Arc::clone(&log);
            tokio::spawn(async move {
                // Read until the end of the request head.
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let Ok(n) = sock.read(&mut buf).await else {
                        return;
                    };
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let head = String::from_utf8_lossy(&head);
                if let Some(request_line) = head.lines().next() {
                    log.lock().unwrap().push(request_line.to_string());
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), requests)
}

#[tokio::test]
async fn create_room_returns_the_room_code() {
    let (base, requests) = start_mock_http("200 OK", "amber-otter-lane").await;

    let provisioner = ProvisioningClient::new(&base);
    let room_code = provisioner.create_room().await.unwrap();

    assert_eq!(room_code, "amber-otter-lane");
    assert_eq!(
        requests.lock().unwrap().as_slice(),
        ["POST /api/create-room HTTP/1.1"]
    );
}

#[tokio::test]
async fn create_room_trims_surrounding_whitespace() {
    let (base, _requests) = start_mock_http("200 OK", "amber-otter-lane\n").await;

    let provisioner = ProvisioningClient::new(&base);
    assert_eq!(provisioner.create_room().await.unwrap(), "amber-otter-lane");
}

#[tokio::test]
async fn create_room_failure_surfaces_status() {
    let (base, _requests) = start_mock_http("500 Internal Server Error", "").await;

    let provisioner = ProvisioningClient::new(&base);
    let err = provisioner.create_room().await.unwrap_err();
    assert!(matches!(
        err,
        BrainlookError::Provisioning { status: 500, .. }
    ));
}

#[tokio::test]
async fn join_room_posts_the_code_in_the_path() {
    let (base, requests) = start_mock_http("200 OK", "OK").await;

    let provisioner = ProvisioningClient::new(&base);
    provisioner.join_room("amber-otter-lane").await.unwrap();

    assert_eq!(
        requests.lock().unwrap().as_slice(),
        ["POST /api/join-room/amber-otter-lane HTTP/1.1"]
    );
}

#[tokio::test]
async fn join_missing_room_is_a_provisioning_error() {
    // Join returns non-2xx: no socket is constructed and a provisioning
    // error is surfaced. The error carries the status so the caller can
    // distinguish "missing" from "full".
    let (base, _requests) = start_mock_http("404 Not Found", "").await;

    let provisioner = ProvisioningClient::new(&base);
    let err = provisioner.join_room("ABCD").await.unwrap_err();

    let BrainlookError::Provisioning { status, .. } = err else {
        panic!("expected Provisioning error, got {err:?}");
    };
    assert_eq!(status, 404);
}

#[cfg(feature = "transport-websocket")]
#[tokio::test]
async fn join_room_session_fails_without_opening_a_socket() {
    use brainlook_client::{join_room_session, SessionConfig};

    let (base, requests) = start_mock_http("404 Not Found", "").await;

    // ws_base points at a closed port; if provisioning failure did not
    // short-circuit, the connect attempt would fail with an Io error instead.
    let result = join_room_session(&base, "ws://127.0.0.1:1", SessionConfig::new("ABCD", "Ann")).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        BrainlookError::Provisioning { status: 404, .. }
    ));
    // Only the provisioning request was made.
    assert_eq!(
        requests.lock().unwrap().as_slice(),
        ["POST /api/join-room/ABCD HTTP/1.1"]
    );
}

#[tokio::test]
async fn network_failure_is_an_http_error() {
    let provisioner = ProvisioningClient::new("http://127.0.0.1:1");
    let err = provisioner.join_room("ABCD").await.unwrap_err();
    assert!(matches!(err, BrainlookError::Http(_)));
}
