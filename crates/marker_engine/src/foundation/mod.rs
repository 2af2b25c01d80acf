//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and operations
//! - Geometry checksums for change detection
//! - Logging utilities

pub mod math;
pub mod checksum;
pub mod logging;
