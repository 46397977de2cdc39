//! Built-in default values.
//!
//! Grouped by config section. These are what the exporter runs with when no
//! TOML file is found and no overrides are given.

// ============================================================================
// Server
// ============================================================================

/// Listen address. A bare `:port` binds every interface.
pub const LISTEN_ADDRESS: &str = ":8080";

/// Config file picked up from the working directory when present.
pub const LOCAL_CONFIG_FILE: &str = "druid_exporter.toml";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DTE_CONFIG";

// ============================================================================
// Druid
// ============================================================================

/// Router or broker SQL API. Placeholder host, meant to be overridden.
pub const DRUID_URI: &str = "http://BROKER:8082/druid/v2/sql/";

/// Client-side timeout for one SQL round trip (seconds). 0 disables it.
pub const DRUID_TIMEOUT_SECS: u64 = 30;

/// Upper bound on how much of an error body is kept for logging (bytes).
pub const ERROR_BODY_SNIPPET_BYTES: usize = 512;

// ============================================================================
// Metric
// ============================================================================

pub const METRIC_NAME: &str = "dte_druid_tasks_total";

pub const METRIC_HELP: &str = "Total number of Druid tasks per type and status.";

/// Column grouped on in `sys.tasks`; doubles as the status label name.
pub const STATUS_COLUMN: &str = "runner_status";

/// Label carrying the task kind. Fixed.
pub const TYPE_LABEL: &str = "type";

// ============================================================================
// Label Universe
// ============================================================================

pub const KNOWN_TYPES: &[&str] = &[
    "single_phase_sub_task",
    "index",
    "index_parallel",
    "kill",
    "compact",
];

/// Values of `sys.tasks.runner_status`.
pub const KNOWN_RUNNER_STATUSES: &[&str] = &["NONE", "PENDING", "RUNNING", "WAITING"];

/// Values of `sys.tasks.status`.
pub const KNOWN_TASK_STATUSES: &[&str] = &["RUNNING", "SUCCESS", "FAILED"];

/// Default status enumeration for a given status column.
pub fn known_statuses_for(status_column: &str) -> &'static [&'static str] {
    match status_column {
        "status" => KNOWN_TASK_STATUSES,
        _ => KNOWN_RUNNER_STATUSES,
    }
}

pub(crate) fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}
