//! Wiremock servers need a loopback socket; some sandboxes forbid binding one.
//!
//! Tests call [`start_mock_server_or_skip`] (or [`bind_loopback_or_skip`] for a
//! hand-written server) and return early on `None`.
//! Setting `HOSTDL_REQUIRE_SOCKET_TESTS=1` turns the skip into a failure.

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_ENV: &str = "HOSTDL_REQUIRE_SOCKET_TESTS";

fn skipping_forbidden() -> bool {
    std::env::var(REQUIRE_ENV)
        .is_ok_and(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

fn skip(error: &std::io::Error) {
    let message = format!("loopback bind failed ({error}); skipping socket test");
    assert!(!skipping_forbidden(), "{message} ({REQUIRE_ENV} is set)");
    eprintln!("{message}");
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if let Err(error) = TcpListener::bind("127.0.0.1:0") {
        skip(&error);
        return None;
    }
    Some(MockServer::start().await)
}

pub async fn bind_loopback_or_skip() -> Option<tokio::net::TcpListener> {
    match tokio::net::TcpListener::bind("127.0.0.1:0").await {
        Ok(listener) => Some(listener),
        Err(error) => {
            skip(&error);
            None
        }
    }
}
