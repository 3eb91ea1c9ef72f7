//! Skips socket-bound tests in sandboxes that forbid binding localhost.

use std::net::TcpListener;

use wiremock::MockServer;

/// True if a loopback TCP listener can be bound.
pub fn sockets_available() -> bool {
    match TcpListener::bind("127.0.0.1:0") {
        Ok(_) => true,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping: binding 127.0.0.1 is not permitted here ({e})");
            false
        }
        Err(_) => true,
    }
}

/// Starts a wiremock server, or returns `None` when sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if !sockets_available() {
        return None;
    }
    Some(MockServer::start().await)
}

/// Value returned by a test body that was skipped.
pub fn socket_skip_return<T: Default>() -> T {
    T::default()
}
