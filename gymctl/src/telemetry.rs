//! Tracing setup: env-filtered fmt logging.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber. Respects `RUST_LOG`, defaulting to
/// `info`. Safe to call more than once; later calls are no-ops.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry().with(env_filter).with(fmt::layer()).try_init();
}
