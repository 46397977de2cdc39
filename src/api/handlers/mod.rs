//! API route handlers
//!
//! - `/metrics`: on-demand Druid task collection
//! - `/`: liveness

mod metrics;
mod status;

pub use metrics::*;
pub use status::*;

use std::sync::Arc;

use crate::collector::TaskCollector;

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers. Read-only after startup.
#[derive(Clone)]
pub struct ExporterState {
    pub collector: Arc<TaskCollector>,
}

impl ExporterState {
    pub fn new(collector: TaskCollector) -> Self {
        Self {
            collector: Arc::new(collector),
        }
    }
}
