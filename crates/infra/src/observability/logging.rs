//! Tracing initialisation.
//!
//! Filter level comes from the `CHIME_LOG` environment variable with an
//! `info` default, e.g. `CHIME_LOG=chime_core=debug,info`.

use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV_VAR: &str = "CHIME_LOG";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; subsequent calls are ignored so tests
/// and embedding applications cannot trip over each other.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
