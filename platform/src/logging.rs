//! Logging setup from the platform configuration.

use crate::config::PlatformConfig;

/// Install the tracing subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.log_level` when set.
pub fn init_logging(config: &PlatformConfig) {
    shield_utils::init_tracing(config.log_format(), &config.log_level);
}
