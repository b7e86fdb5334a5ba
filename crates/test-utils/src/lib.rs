//! Shared helpers for rube's integration tests.
//!
//! - [`builders`]: assemble manifests in code instead of JSON strings.
//! - [`fake_executor`]: an `ExecutorBackend` that never spawns a process.

pub mod builders;
pub mod fake_executor;

use std::future::Future;
use std::time::Duration;

use rube::logging::LOG_ENV;
use tracing_subscriber::{EnvFilter, fmt};

/// How long a single runtime test may take before it counts as hung.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Route rube's logs into the test harness's captured output.
///
/// Reads the same `RUBE_LOG` variable as the binary, defaulting to `info`.
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}

/// Await `f`, failing the test if it outlives [`TEST_TIMEOUT`].
///
/// A stalled device or a lost `ItemFinished` shows up here as a timeout
/// rather than a hung test run.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(TEST_TIMEOUT, f).await {
        Ok(value) => value,
        Err(_) => panic!("runtime did not settle within {TEST_TIMEOUT:?}"),
    }
}
