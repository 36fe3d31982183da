#![allow(dead_code, missing_docs, clippy::expect_used, clippy::missing_errors_doc)]

use std::sync::Arc;

use rstest::fixture;
use tracing::info;

mod fake_conjur;
pub use self::fake_conjur::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn server() -> TestServer {
    init_tracing();
    match TestServer::start().await {
        Ok(server) => server,
        Err(error) => {
            panic!("fail to start fake conjur: {error:?}");
        }
    }
}

/// Provider that logs in against the fake server.
pub fn authn(server: &TestServer) -> Arc<FakeAuthn> {
    Arc::new(FakeAuthn::new(Arc::clone(&server.state)))
}
