//! Utilities module
//!
//! This module provides utility functions for common operations:
//! - Logger setup
//! - Formatting helpers
//!
//! # Example
//!
//! ```rust
//! use deck_db::utils::{Helpers, Logger};
//!
//! Logger::init();
//! assert_eq!(Helpers::placeholders(3), "?, ?, ?");
//! ```

pub mod helpers;
pub mod logger;

// Re-export main types for convenience
pub use helpers::Helpers;
pub use logger::Logger;
