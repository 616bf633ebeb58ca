//! Process-wide tracing setup.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_DIRECTIVES: &str = "info,tower_http=debug";

static INIT: OnceCell<()> = OnceCell::new();

/// Installs the fmt subscriber once; `RUST_LOG` overrides the default filter.
///
/// A subscriber installed earlier by someone else (a test harness, an
/// embedding binary) is left in place.
pub fn init_tracing() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}
