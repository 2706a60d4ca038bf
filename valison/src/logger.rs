// valison/src/logger.rs
//! Logger setup for the `valison` binary.
//!
//! `VALISON_LOG` takes precedence over `RUST_LOG`; both use the `env_logger`
//! filter syntax. An explicit level from the command line overrides either.
//!
//! License: MIT OR APACHE 2.0

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

pub const LOG_ENV: &str = "VALISON_LOG";

/// Initializes the global logger. Calling it again is a no-op.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = if std::env::var_os(LOG_ENV).is_some() {
        Builder::from_env(Env::new().filter(LOG_ENV))
    } else {
        Builder::from_env(Env::default().default_filter_or("warn"))
    };

    if let Some(level) = level {
        builder.filter_level(level);
    }

    builder.format_timestamp(None).target(Target::Stderr);
    // Tests and embedders may have installed a logger already.
    let _ = builder.try_init();
}
