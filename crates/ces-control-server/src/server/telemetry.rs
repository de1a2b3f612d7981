//! Logging setup.
//!
//! Installs the global `tracing` subscriber: an `EnvFilter` honoring
//! `RUST_LOG` (defaulting to `info`) feeding a fmt layer on stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
