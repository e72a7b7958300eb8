//! Wiremock-backed tests for the GitHub and GitLab gateways.

use rstest::fixture;
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer};

mod gitlab;

pub(super) struct ServerFixture {
    runtime: Runtime,
    server: MockServer,
}

impl ServerFixture {
    pub(super) fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub(super) fn mount(&self, mock: Mock) {
        self.block_on(mock.mount(&self.server));
    }

    /// Absolute URL on the mock server for a web path such as
    /// `/org/repo/pull/42`.
    pub(super) fn web_url(&self, path: &str) -> String {
        format!("{}{path}", self.server.uri())
    }

    pub(super) fn enter(&self) -> tokio::runtime::EnterGuard<'_> {
        self.runtime.enter()
    }
}

#[fixture]
pub(super) fn server_fixture() -> ServerFixture {
    let runtime = Runtime::new().expect("runtime should start");
    let server = runtime.block_on(MockServer::start());
    ServerFixture { runtime, server }
}
