//! Druid Tasks Exporter
//!
//! Republishes Druid task counts as Prometheus gauges. Every scrape of
//! `/metrics` runs one aggregation query against the Druid SQL API, fills in
//! explicit zeros for known (type, status) combinations that have no tasks,
//! and renders the result as a single gauge family.
//!
//! ## Architecture
//!
//! - **druid**: SQL-over-HTTP query client and row decoding
//! - **collector**: zero-fill reconciliation and text exposition
//! - **api**: axum router for `/metrics` and liveness
//! - **config**: TOML + CLI/env configuration

pub mod api;
pub mod collector;
pub mod config;
pub mod druid;
pub mod types;

pub use config::ExporterConfig;

pub use types::{LabelUniverse, MetricSample, TaskCountRecord};

pub use druid::{DecodeError, DruidClient, QueryError, TaskSource};

pub use collector::{reconcile, GaugeFamily, ScrapeError, TaskCollector};

pub use api::{create_app, ExporterState};
