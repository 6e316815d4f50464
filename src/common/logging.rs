//! Tracing subscriber setup
//!
//! The subscriber is installed before the config file is read so load
//! failures are logged too; the configured `log_level` is applied afterwards
//! unless `RUST_LOG` or `--log-level` already pinned the filter.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

/// Handle for adjusting the global filter once the config is known.
pub struct LogHandle {
    reload: Option<reload::Handle<EnvFilter, Registry>>,
    pinned: bool,
}

impl LogHandle {
    /// Switch to the config file's level, unless the filter was pinned.
    pub fn apply_config_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        if let Some(handle) = &self.reload {
            if let Err(e) = handle.reload(EnvFilter::new(level)) {
                tracing::warn!(action = "logging.reload.failed", config_level = level, error = %e);
            }
        }
    }
}

/// Starting filter directive and whether it overrides the config file.
/// `--log-level` wins over `RUST_LOG`, which wins over the config.
fn initial_directive(cli_level: Option<&str>, rust_log: Option<&str>) -> (String, bool) {
    match (cli_level, rust_log) {
        (Some(level), _) => (level.to_string(), true),
        (None, Some(env)) if !env.trim().is_empty() => (env.to_string(), true),
        _ => (DEFAULT_LEVEL.to_string(), false),
    }
}

/// Install the global subscriber.
pub fn init_logging(cli_level: Option<&str>) -> LogHandle {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (directive, pinned) = initial_directive(cli_level, rust_log.as_deref());

    let (filter, handle) = reload::Layer::new(EnvFilter::new(directive));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    LogHandle {
        reload: installed.then_some(handle),
        pinned,
    }
}
