//! Tracing subscriber setup for hosts and tests.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Install a global fmt subscriber filtered by `RUST_LOG`.
///
/// Only the first call installs anything; later calls return `Ok(())`. If the
/// host already installed its own global subscriber, that is reported as an
/// error and the host's subscriber stays in place.
pub fn init() -> anyhow::Result<()> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))
        })
        .map(|_| ())
}

/// Like [`init`], but routes output through the test harness capture.
///
/// Integration tests in other crates call this too, so it is not gated on
/// `cfg(test)`.
pub fn init_for_tests() {
    // Several test binaries race to install; losing to another global
    // subscriber still leaves output captured, so the error is dropped.
    let _ = INSTALLED.get_or_try_init(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))
    });
}
