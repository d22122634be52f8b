//! Logging bootstrap

use crate::config::{Config, LogLevel};
use tracing_subscriber::EnvFilter;

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Returns `false` if a subscriber
/// was already installed, which is not an error for hosts that embed several
/// machines.
pub fn init(level: LogLevel) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

/// Install the subscriber at the level from `config.debug`
pub fn init_from(config: &Config) -> bool {
    init(config.debug.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let _ = init(LogLevel::Debug);
        assert!(!init(LogLevel::Debug));
        assert!(!init_from(&Config::default()));
    }
}
