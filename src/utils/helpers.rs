//! Helper functions
//!
//! Small formatting helpers shared by the loader, gateway and CLI.
//!
//! # Example
//!
//! ```rust
//! use deck_db::utils::Helpers;
//! use std::time::Duration;
//!
//! assert_eq!(Helpers::format_duration_from(Duration::from_millis(250)), "250ms");
//! assert_eq!(Helpers::placeholders(2), "?, ?");
//! ```

use std::time::Duration;

/// Helper functions
pub struct Helpers;

impl Helpers {
    /// Format duration to human-readable string
    ///
    /// # Arguments
    /// * `nanos` - Duration in nanoseconds
    ///
    /// # Returns
    /// Formatted string (e.g., "1.23s", "500ms", "800µs")
    pub fn format_duration(nanos: u64) -> String {
        let duration = Duration::from_nanos(nanos);
        if duration.as_secs() >= 1 {
            format!("{:.2}s", duration.as_secs_f64())
        } else if duration.as_millis() >= 1 {
            format!("{}ms", duration.as_millis())
        } else if duration.as_micros() >= 1 {
            format!("{}µs", duration.as_micros())
        } else {
            format!("{}ns", nanos)
        }
    }

    /// Format a [`Duration`], saturating at `u64::MAX` nanoseconds
    pub fn format_duration_from(duration: Duration) -> String {
        Self::format_duration(u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX))
    }

    /// `count` positional bind markers separated by commas
    ///
    /// # Example
    /// ```
    /// use deck_db::utils::Helpers;
    ///
    /// assert_eq!(Helpers::placeholders(1), "?");
    /// assert_eq!(Helpers::placeholders(0), "");
    /// ```
    pub fn placeholders(count: usize) -> String {
        vec!["?"; count].join(", ")
    }

    /// Pluralize a row count for log lines
    pub fn rows(count: usize) -> String {
        if count == 1 {
            "1 row".to_string()
        } else {
            format!("{} rows", count)
        }
    }
}
