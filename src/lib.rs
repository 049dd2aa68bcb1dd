//! YAMLRelay - propagate fields between YAML resource documents.
//!
//! A batch of resource documents is rewritten by an ordered list of
//! replacement rules. Each rule binds one or more source documents to
//! variables and runs jq-style expressions over every matching target.
//!
//! The crate is organized into the following modules:
//!
//! - [`document`]: Value model, resource identity and YAML stream parsing
//! - [`query`]: The jq expression language, evaluated with jaq
//! - [`selector`]: Regex and label-based document selection
//! - [`engine`]: Rules and the replacement engine
//! - [`file`]: Loading and saving streams and function configs
//! - [`config`]: User settings for the command-line host

pub mod config;
pub mod document;
pub mod engine;
pub mod file;
pub mod query;
pub mod selector;
