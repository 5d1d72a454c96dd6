//! a11y: accessibility scan insight engine
//!
//! Builds filtered queries over stored accessibility issues and aggregates
//! them into cached site and post type summaries.

pub mod cli;
pub mod core;
