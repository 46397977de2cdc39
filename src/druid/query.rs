//! The fixed task aggregation query.

use serde::Serialize;

/// Request body accepted by Druid's SQL endpoint: `{"query": "<sql>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SqlRequest {
    pub query: String,
}

/// `GROUP BY` over `sys.tasks` on task type and one status column.
///
/// The column name must already be validated as a plain identifier; it is
/// spliced into the SQL text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    status_column: String,
}

impl TaskQuery {
    pub fn new(status_column: impl Into<String>) -> Self {
        Self {
            status_column: status_column.into(),
        }
    }

    pub fn status_column(&self) -> &str {
        &self.status_column
    }

    pub fn sql(&self) -> String {
        let col = &self.status_column;
        format!("SELECT type,{col},count(*) AS total FROM sys.tasks GROUP BY type,{col}")
    }

    pub fn request_body(&self) -> SqlRequest {
        SqlRequest { query: self.sql() }
    }
}
