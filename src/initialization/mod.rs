//! Shared resource initialization.
//!
//! This module provides functions to initialize:
//! - The logger (plain or JSON output)
//! - The HTTP client used by the HTTP backend

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
