// clipscrub/src/logger.rs
//! Logger setup for the `clipscrub` binary.
//!
//! Log lines go to stderr as `[LEVEL target] message` so stdout carries only
//! redacted text. `RUST_LOG` is honoured unless an explicit level is passed.
//!
//! License: MIT OR Apache-2.0

use std::io::Write;

use env_logger::{Builder, Env, Target};
use log::LevelFilter;

const DEFAULT_FILTER: &str = "warn";

/// Initialises the global logger.
///
/// `Some(level)` forces that level for every target, overriding `RUST_LOG`.
/// `None` reads `RUST_LOG`, falling back to `warn`. Calling this twice is
/// harmless; the second call is ignored.
pub fn init_logger(level: Option<LevelFilter>) {
    let mut builder = match level {
        Some(level) => {
            let mut builder = Builder::new();
            builder.filter_level(level);
            builder
        }
        None => Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER)),
    };
    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
        });
    let _ = builder.try_init();
}

/// Maps the `--quiet` / `--debug` flags to a forced level.
pub fn level_from_flags(quiet: bool, debug: bool) -> Option<LevelFilter> {
    if quiet {
        Some(LevelFilter::Off)
    } else if debug {
        Some(LevelFilter::Debug)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_wins_over_debug() {
        assert_eq!(level_from_flags(true, true), Some(LevelFilter::Off));
        assert_eq!(level_from_flags(false, true), Some(LevelFilter::Debug));
        assert_eq!(level_from_flags(false, false), None);
    }
}
