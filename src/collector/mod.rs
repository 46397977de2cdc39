//! Scrape-driven collection pipeline
//!
//! Each `/metrics` request runs one pass of:
//!
//! 1. [`TaskSource::fetch`]: query Druid for per-(type, status) counts
//! 2. [`reconcile`]: zero-fill known combinations the query did not return
//! 3. [`GaugeFamily::encode`]: render the gauge family as exposition text
//!
//! Nothing is cached between passes. Concurrent scrapes each run their own
//! pass and their own upstream query.

pub mod exposition;
pub mod reconcile;

pub use exposition::{GaugeFamily, CONTENT_TYPE};
pub use reconcile::{missing_pairs, reconcile};

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use tracing::debug;

use crate::config::ExporterConfig;
use crate::druid::{DruidClient, QueryError, TaskSource};
use crate::types::{LabelUniverse, MetricSample};

/// A scrape that could not produce exposition output.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error("failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}

impl ScrapeError {
    /// HTTP status the scrape handler answers with.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Query(_) => StatusCode::BAD_GATEWAY,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Ties a task source to the reconcile policy and the exposed family.
pub struct TaskCollector {
    source: Arc<dyn TaskSource>,
    universe: Option<LabelUniverse>,
    family: GaugeFamily,
}

impl TaskCollector {
    pub fn new(source: Arc<dyn TaskSource>, universe: Option<LabelUniverse>, family: GaugeFamily) -> Self {
        Self {
            source,
            universe,
            family,
        }
    }

    /// Production wiring: a [`DruidClient`] configured from `config`.
    pub fn from_config(config: &ExporterConfig) -> Result<Self, reqwest::Error> {
        let client = DruidClient::new(&config.druid, &config.metric.status_column)?;
        Ok(Self::new(
            Arc::new(client),
            config.label_universe(),
            GaugeFamily::from_config(&config.metric),
        ))
    }

    pub const fn universe(&self) -> Option<&LabelUniverse> {
        self.universe.as_ref()
    }

    pub const fn family(&self) -> &GaugeFamily {
        &self.family
    }

    pub fn source_name(&self) -> &str {
        self.source.source_name()
    }

    /// Fetch and reconcile, without encoding.
    pub async fn collect(&self) -> Result<Vec<MetricSample>, QueryError> {
        let records = self.source.fetch().await?;
        let observed = records.len();
        let samples = reconcile(records, self.universe.as_ref());

        debug!(
            source = %self.source.source_name(),
            observed,
            backfilled = samples.len() - observed,
            "Reconciled task counts"
        );

        Ok(samples)
    }

    /// One full collection cycle, returning the exposition body.
    ///
    /// On error nothing is rendered; there are no partial scrapes.
    pub async fn scrape(&self) -> Result<String, ScrapeError> {
        let started = Instant::now();
        let samples = self.collect().await?;
        let body = self.family.encode(&samples)?;

        debug!(
            samples = samples.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "Scrape complete"
        );

        Ok(body)
    }
}
