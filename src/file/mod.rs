//! File I/O for resource streams and function configs.
//!
//! This module loads multi-document YAML from disk or stdin, reads function
//! configs, and writes result streams back with atomic writes and optional
//! backups.

pub mod loader;
pub mod saver;
