//! Exporter Configuration
//!
//! One [`ExporterConfig`] is assembled at startup from a TOML file plus
//! CLI/env overrides, validated, and then handed by reference to the
//! query client and the collector. Nothing here is global or mutable
//! after startup.
//!
//! ## Loading Order
//!
//! 1. `--config <path>` on the command line (failure is fatal)
//! 2. `DTE_CONFIG` environment variable (path to TOML file)
//! 3. `druid_exporter.toml` in the current working directory
//! 4. Built-in defaults
//!
//! Individual fields are then overridden by CLI flags / env vars through
//! [`ConfigOverrides`].

mod exporter_config;
pub mod defaults;
pub mod validation;

pub use exporter_config::*;
