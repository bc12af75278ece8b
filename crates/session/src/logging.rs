//! Logging setup for binaries and tests embedding the session controller

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over the `debug` flag when set. Returns `false` if a
/// subscriber was already installed.
pub fn init(debug: bool) -> bool {
    let default_level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string().to_lowercase()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}
