//! Core data types shared by the query client and the reconciler.
//!
//! - [`TaskCountRecord`]: one aggregated row from the upstream `GROUP BY` query
//! - [`LabelUniverse`]: the configured task types and statuses that must always be emitted
//! - [`MetricSample`]: a `(type, status, total)` point ready for exposition

use serde::{Deserialize, Serialize};

// ============================================================================
// Task Count Record
// ============================================================================

/// One row of the task aggregation query.
///
/// Produced fresh on every scrape and dropped once converted into a
/// [`MetricSample`]. The status value comes from whichever column the
/// exporter is configured to group by (`status` or `runner_status`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCountRecord {
    /// Task kind, e.g. `index_parallel`
    pub task_type: String,
    /// Lifecycle state, e.g. `RUNNING`
    pub status: String,
    /// Number of tasks in this (type, status) bucket
    pub total: u64,
}

impl TaskCountRecord {
    pub fn new(task_type: impl Into<String>, status: impl Into<String>, total: u64) -> Self {
        Self {
            task_type: task_type.into(),
            status: status.into(),
            total,
        }
    }

    /// Borrowed `(type, status)` key used for set membership.
    pub fn key(&self) -> (&str, &str) {
        (self.task_type.as_str(), self.status.as_str())
    }
}

// ============================================================================
// Label Universe
// ============================================================================

/// Known task types and statuses that must appear in every scrape.
///
/// Static configuration, never derived from upstream data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelUniverse {
    pub types: Vec<String>,
    pub statuses: Vec<String>,
}

impl LabelUniverse {
    pub fn new(types: Vec<String>, statuses: Vec<String>) -> Self {
        Self { types, statuses }
    }

    /// Every `(type, status)` combination, statuses in the outer loop.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.statuses.iter().flat_map(move |status| {
            self.types
                .iter()
                .map(move |task_type| (task_type.as_str(), status.as_str()))
        })
    }

    /// Size of the cartesian product.
    pub fn len(&self) -> usize {
        self.types.len() * self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, task_type: &str, status: &str) -> bool {
        self.types.iter().any(|t| t == task_type) && self.statuses.iter().any(|s| s == status)
    }
}

// ============================================================================
// Metric Sample
// ============================================================================

/// A single gauge point labelled by task type and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricSample {
    pub task_type: String,
    pub status: String,
    pub total: u64,
    /// True when the sample was backfilled with zero rather than observed
    pub synthetic: bool,
}

impl MetricSample {
    /// Zero-valued sample for a combination the upstream did not report.
    pub fn zero(task_type: &str, status: &str) -> Self {
        Self {
            task_type: task_type.to_string(),
            status: status.to_string(),
            total: 0,
            synthetic: true,
        }
    }

    /// Gauge value as exposed to the scraper.
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.total as f64
    }

    pub fn key(&self) -> (&str, &str) {
        (self.task_type.as_str(), self.status.as_str())
    }
}

impl From<TaskCountRecord> for MetricSample {
    fn from(record: TaskCountRecord) -> Self {
        Self {
            task_type: record.task_type,
            status: record.status,
            total: record.total,
            synthetic: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> LabelUniverse {
        LabelUniverse::new(
            vec!["index".to_string(), "kill".to_string()],
            vec!["RUNNING".to_string(), "PENDING".to_string(), "NONE".to_string()],
        )
    }

    #[test]
    fn test_pairs_is_full_cartesian_product() {
        let u = universe();
        let pairs: Vec<_> = u.pairs().collect();
        assert_eq!(pairs.len(), 6);
        assert_eq!(u.len(), 6);
        assert!(pairs.contains(&("kill", "NONE")));
        assert!(pairs.contains(&("index", "PENDING")));
    }

    #[test]
    fn test_empty_dimension_yields_no_pairs() {
        let u = LabelUniverse::new(vec!["index".to_string()], Vec::new());
        assert!(u.is_empty());
        assert_eq!(u.pairs().count(), 0);
    }

    #[test]
    fn test_contains_checks_both_dimensions() {
        let u = universe();
        assert!(u.contains("index", "RUNNING"));
        assert!(!u.contains("compact", "RUNNING"));
        assert!(!u.contains("index", "WAITING"));
    }

    #[test]
    fn test_sample_from_record_is_not_synthetic() {
        let sample = MetricSample::from(TaskCountRecord::new("index", "RUNNING", 3));
        assert!(!sample.synthetic);
        assert_eq!(sample.value(), 3.0);
        assert_eq!(sample.key(), ("index", "RUNNING"));
    }
}
