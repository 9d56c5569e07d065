//! Infrastructure: configuration loading and process wiring.

pub mod config;
