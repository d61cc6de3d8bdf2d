//! Logging setup
//!
//! The library only emits records through the `log` facade; binaries call
//! [`Logger::init`] once to route them through `env_logger`.
//!
//! # Example
//!
//! ```rust
//! use deck_db::utils::Logger;
//! use log::LevelFilter;
//!
//! Logger::init_with_level(LevelFilter::Debug);
//! log::debug!("logger ready");
//! ```

use log::LevelFilter;

/// Logger setup
pub struct Logger;

impl Logger {
    /// Initialize the logger at `info`
    ///
    /// `RUST_LOG` still refines the filter per module (e.g.
    /// `RUST_LOG=deck_db::database=debug`).
    pub fn init() {
        Self::init_with_level(LevelFilter::Info);
    }

    /// Initialize the logger with a base level
    ///
    /// Calling this more than once is harmless; later calls are ignored.
    ///
    /// # Arguments
    /// * `level` - Log level filter
    pub fn init_with_level(level: LevelFilter) {
        let _ = env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .try_init();
    }

    /// Level for a `-v` count: 0 → info, 1 → debug, more → trace
    pub fn level_for_verbosity(verbose: u8) -> LevelFilter {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
