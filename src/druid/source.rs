//! Task count source abstraction.
//!
//! The collector only needs "give me the current task counts". Putting that
//! behind a trait keeps the reconcile/emit pipeline independent of the HTTP
//! transport.

use async_trait::async_trait;

use super::QueryError;
use crate::types::TaskCountRecord;

/// Where per-(type, status) task counts come from.
///
/// Called once per scrape. Implementations must be safe to call from
/// concurrent scrapes; there is no caching or de-duplication above them.
#[async_trait]
pub trait TaskSource: Send + Sync + 'static {
    /// Run one aggregation round trip and return the decoded rows.
    async fn fetch(&self) -> Result<Vec<TaskCountRecord>, QueryError>;

    /// Human-readable name for logging (e.g. the upstream URI).
    fn source_name(&self) -> &str;
}

/// Fixed in-memory rows. Used where no broker is available.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<TaskCountRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<TaskCountRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl TaskSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<TaskCountRecord>, QueryError> {
        Ok(self.records.clone())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}
