//! Loopback publisher for tests that need real HTTP.

use std::net::TcpListener;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Set to `1`/`true`/`yes` to fail instead of skipping when loopback is blocked.
const REQUIRE_SOCKETS_ENV: &str = "DOCLINK_REQUIRE_SOCKET_TESTS";

/// A wiremock server standing in for a publisher's document host.
pub struct MockPublisher {
    server: MockServer,
}

impl MockPublisher {
    /// Starts the publisher, or returns `None` when loopback sockets cannot
    /// be bound in this environment.
    ///
    /// # Panics
    ///
    /// Panics instead of skipping when `DOCLINK_REQUIRE_SOCKET_TESTS` is set.
    pub async fn start() -> Option<Self> {
        if TcpListener::bind("127.0.0.1:0").is_err() {
            assert!(
                !sockets_required(),
                "cannot bind a loopback socket and {REQUIRE_SOCKETS_ENV} is set"
            );
            eprintln!(
                "skipping HTTP test: cannot bind a loopback socket (set {REQUIRE_SOCKETS_ENV}=1 to fail instead)"
            );
            return None;
        }
        Some(Self {
            server: MockServer::start().await,
        })
    }

    /// Base URL, usable as the catalogue's template base.
    pub fn base(&self) -> String {
        self.server.uri()
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{route}", self.server.uri())
    }

    /// Answers every GET on `route` with `response`.
    pub async fn serve(&self, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Mounts a hand-built mock, for header matchers or call-count expectations.
    pub async fn mount(&self, mock: Mock) {
        mock.mount(&self.server).await;
    }
}

fn sockets_required() -> bool {
    std::env::var(REQUIRE_SOCKETS_ENV).is_ok_and(|value| {
        matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
    })
}
