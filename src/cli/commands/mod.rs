//! CLI command implementations

pub mod cache;
pub mod completions;
pub mod init;
pub mod issues;
pub mod summary;
