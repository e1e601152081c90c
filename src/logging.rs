//! Logger setup
//!
//! The library only talks to the `log` facade. Binaries call [`init`] once
//! to install `env_logger` behind it.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` picks between debug output
/// (spawns, kills, patch transitions) and run lifecycle messages only.
pub fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let env = Env::default().default_filter_or(format!("ring_world={level}"));
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // Fails only when a logger is already installed, e.g. across tests
    let _ = builder.try_init();
}
