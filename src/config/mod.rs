//! Configuration module
//!
//! Settings for dispatchers, logging and the key tester's bindings, stored
//! as TOML in the user's config directory.

pub mod config;

pub use config::{Config, DispatcherConfig, LoggingConfig};
