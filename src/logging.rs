//! Logger setup for the binary.
//!
//! The library only talks to the `log` facade; this wires `env_logger` behind
//! it. `RUST_LOG` wins over the verbosity flag.

use log::LevelFilter;

/// Map `-v` occurrences to a default level.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

/// Install the global logger. Calling it twice is harmless.
pub fn init(verbosity: u8) {
    let _ = env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(level_for(verbosity))
        .parse_default_env()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(5), LevelFilter::Debug);
    }
}
