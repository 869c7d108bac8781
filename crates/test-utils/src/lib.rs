//! Shared helpers for treewatch's integration tests.

pub mod fake_primitive;

pub use fake_primitive::{fake_primitive, Call, FakeHandle, FakePrimitive};

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for a single test body.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a test-captured subscriber once per test binary.
///
/// Filter comes from `RUST_LOG` (default `info`), so
/// `RUST_LOG=treewatch=debug cargo test -- --nocapture` shows every
/// registration and invalidation.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .init();
    });
}

/// Fail the test if `f` runs past [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(out) => out,
        Err(_) => panic!("test body exceeded {TEST_TIMEOUT:?}"),
    }
}
