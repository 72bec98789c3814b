//! Station Configuration Module
//!
//! Per-deployment configuration loaded from TOML files, replacing the
//! constants that were hardcoded in the original recorder.
//!
//! ## Loading Order
//!
//! 1. `STATION_CONFIG` environment variable (path to TOML file)
//! 2. `station.toml` in the current working directory
//! 3. Built-in defaults (matching the original deployment values)
//!
//! Configuration errors are fatal at load time — every other component treats
//! a validated `StationConfig` as a precondition and never re-checks it.

mod station_config;
pub mod defaults;

pub use station_config::*;
