//! I/O utilities for archive export.
//!
//! This module provides reusable I/O wrappers shared by the archive sinks.

pub mod counting;

// Re-export main types for convenience
pub use counting::CountingReader;
