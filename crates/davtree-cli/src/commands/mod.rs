//! Subcommand implementations.

pub mod check;
pub mod completion;
pub mod etag;
pub mod export;
pub mod walk;
