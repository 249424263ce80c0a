//! Foundation module - Core utilities and types
//!
//! Fundamental utilities used throughout the engine:
//! - Time management and frame statistics
//! - Logging utilities

pub mod logging;
pub mod time;
