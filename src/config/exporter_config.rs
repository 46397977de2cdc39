use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::defaults;
use crate::types::LabelUniverse;

// ============================================================================
// Top-level Config
// ============================================================================

/// Complete exporter configuration.
///
/// Built once at startup, validated, then shared read-only. All sections
/// are optional in TOML and fall back to [`defaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// HTTP listener
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Druid SQL endpoint
    #[serde(default)]
    pub druid: DruidConfig,

    /// Exposed gauge family
    #[serde(default)]
    pub metric: MetricConfig,

    /// Zero-fill label universe
    #[serde(default)]
    pub labels: LabelsConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Field-level overrides coming from CLI flags or environment variables.
///
/// Applied after the file layer; `None` leaves the file/default value alone.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_address: Option<String>,
    pub druid_uri: Option<String>,
    pub status_column: Option<String>,
    pub zero_fill: Option<bool>,
    pub log_json: Option<bool>,
}

impl ExporterConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DTE_CONFIG` environment variable
    /// 2. `./druid_exporter.toml` in the current working directory
    /// 3. Built-in defaults
    ///
    /// A file that fails to load is logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded exporter config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(path = %local.display(), "Loaded exporter config from working directory");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No exporter config file found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys only produce warnings; parse failures are errors.
    /// Semantic validation is left to [`Self::validate`] so CLI overrides
    /// can be applied first.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse a TOML document, warning about unrecognised keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }
        toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(addr) = overrides.listen_address {
            self.server.listen_address = addr;
        }
        if let Some(uri) = overrides.druid_uri {
            self.druid.uri = uri;
        }
        if let Some(column) = overrides.status_column {
            self.metric.status_column = column;
        }
        if let Some(zero_fill) = overrides.zero_fill {
            self.labels.zero_fill = zero_fill;
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = json;
        }
    }

    /// Statuses used for zero-fill, resolving the column-dependent default.
    pub fn known_statuses(&self) -> Vec<String> {
        self.labels.known_statuses.clone().unwrap_or_else(|| {
            defaults::to_owned_list(defaults::known_statuses_for(&self.metric.status_column))
        })
    }

    /// The zero-fill universe, or `None` when backfill is turned off.
    pub fn label_universe(&self) -> Option<LabelUniverse> {
        self.labels
            .zero_fill
            .then(|| LabelUniverse::new(self.labels.known_types.clone(), self.known_statuses()))
    }

    /// Validate the merged configuration.
    ///
    /// Every problem is collected before returning so a single run reports
    /// all of them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use super::validation::{is_valid_label_name, is_valid_metric_name};

        let mut errors = Vec::new();

        if self.server.listen_address.trim().is_empty() {
            errors.push("server.listen_address must not be empty".to_string());
        }

        match reqwest::Url::parse(&self.druid.uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "druid.uri: unsupported scheme '{}' (expected http or https)",
                url.scheme()
            )),
            Err(e) => errors.push(format!("druid.uri '{}' is not a valid URL: {e}", self.druid.uri)),
        }

        if !is_valid_metric_name(&self.metric.name) {
            errors.push(format!(
                "metric.name '{}' is not a valid Prometheus metric name",
                self.metric.name
            ));
        }

        let column = &self.metric.status_column;
        if !is_valid_label_name(column) {
            errors.push(format!(
                "metric.status_column '{column}' must match [a-zA-Z_][a-zA-Z0-9_]* and not start with '__'"
            ));
        } else if column == defaults::TYPE_LABEL {
            errors.push(format!(
                "metric.status_column cannot be '{}', it is already the task type label",
                defaults::TYPE_LABEL
            ));
        }

        if self.labels.zero_fill {
            Self::check_label_list("labels.known_types", &self.labels.known_types, &mut errors);
            Self::check_label_list("labels.known_statuses", &self.known_statuses(), &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_label_list(name: &str, values: &[String], errors: &mut Vec<String>) {
        if values.is_empty() {
            errors.push(format!("{name} must not be empty while zero_fill is enabled"));
            return;
        }
        let mut seen = HashSet::new();
        for v in values {
            if v.is_empty() {
                errors.push(format!("{name} contains an empty value"));
            } else if !seen.insert(v.as_str()) {
                errors.push(format!("{name} lists '{v}' more than once"));
            }
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on for HTTP requests.
    ///
    /// Overridden by `--listen-address` / `DTE_LISTEN_ADDRESS`.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
        }
    }
}

impl ServerConfig {
    /// Address in a form `TcpListener::bind` accepts: `:8080` becomes `0.0.0.0:8080`.
    pub fn bind_address(&self) -> String {
        let addr = self.listen_address.trim();
        if addr.starts_with(':') {
            format!("0.0.0.0{addr}")
        } else {
            addr.to_string()
        }
    }
}

fn default_listen_address() -> String {
    defaults::LISTEN_ADDRESS.to_string()
}

// ============================================================================
// Druid
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DruidConfig {
    /// Router or broker SQL API URI.
    ///
    /// Overridden by `--druid-uri` / `DTE_DRUID_URI`.
    #[serde(default = "default_druid_uri")]
    pub uri: String,

    /// Per-request timeout in seconds; 0 leaves the transport without one
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DruidConfig {
    fn default() -> Self {
        Self {
            uri: default_druid_uri(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DruidConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn default_druid_uri() -> String {
    defaults::DRUID_URI.to_string()
}

const fn default_timeout_secs() -> u64 {
    defaults::DRUID_TIMEOUT_SECS
}

// ============================================================================
// Metric
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricConfig {
    #[serde(default = "default_metric_name")]
    pub name: String,

    #[serde(default = "default_metric_help")]
    pub help: String,

    /// `sys.tasks` column to group by (`runner_status` or `status`).
    ///
    /// The same string is used as the status label name.
    #[serde(default = "default_status_column")]
    pub status_column: String,
}

impl Default for MetricConfig {
    fn default() -> Self {
        Self {
            name: default_metric_name(),
            help: default_metric_help(),
            status_column: default_status_column(),
        }
    }
}

fn default_metric_name() -> String {
    defaults::METRIC_NAME.to_string()
}

fn default_metric_help() -> String {
    defaults::METRIC_HELP.to_string()
}

fn default_status_column() -> String {
    defaults::STATUS_COLUMN.to_string()
}

// ============================================================================
// Labels
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    /// Emit explicit zeros for known combinations missing from the query result
    #[serde(default = "default_zero_fill")]
    pub zero_fill: bool,

    #[serde(default = "default_known_types")]
    pub known_types: Vec<String>,

    /// `None` picks the default list for the configured status column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_statuses: Option<Vec<String>>,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            zero_fill: default_zero_fill(),
            known_types: default_known_types(),
            known_statuses: None,
        }
    }
}

const fn default_zero_fill() -> bool {
    true
}

fn default_known_types() -> Vec<String> {
    defaults::to_owned_list(defaults::KNOWN_TYPES)
}

// ============================================================================
// Logging
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ExporterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.metric.name, "dte_druid_tasks_total");
        assert_eq!(config.metric.status_column, "runner_status");
        assert_eq!(config.druid.uri, "http://BROKER:8082/druid/v2/sql/");
    }

    #[test]
    fn test_default_universe_is_twenty_pairs() {
        let universe = ExporterConfig::default().label_universe().unwrap();
        assert_eq!(universe.types.len(), 5);
        assert_eq!(universe.statuses, vec!["NONE", "PENDING", "RUNNING", "WAITING"]);
        assert_eq!(universe.len(), 20);
    }

    #[test]
    fn test_status_column_switches_default_statuses() {
        let mut config = ExporterConfig::default();
        config.apply_overrides(ConfigOverrides {
            status_column: Some("status".to_string()),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.known_statuses(), vec!["RUNNING", "SUCCESS", "FAILED"]);
    }

    #[test]
    fn test_explicit_statuses_win_over_column_default() {
        let config = ExporterConfig::from_toml_str(
            r#"
[metric]
status_column = "status"

[labels]
known_statuses = ["SUCCESS"]
"#,
        )
        .unwrap();
        assert_eq!(config.known_statuses(), vec!["SUCCESS"]);
    }

    #[test]
    fn test_zero_fill_off_means_no_universe() {
        let mut config = ExporterConfig::default();
        config.apply_overrides(ConfigOverrides {
            zero_fill: Some(false),
            ..ConfigOverrides::default()
        });
        assert!(config.label_universe().is_none());
    }

    #[test]
    fn test_bind_address_expands_bare_port() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address(), "0.0.0.0:8080");

        let server = ServerConfig {
            listen_address: "127.0.0.1:9000".to_string(),
        };
        assert_eq!(server.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_timeout_zero_disables() {
        let druid = DruidConfig {
            timeout_secs: 0,
            ..DruidConfig::default()
        };
        assert!(druid.timeout().is_none());
        assert_eq!(DruidConfig::default().timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validation_collects_every_error() {
        let mut config = ExporterConfig::default();
        config.druid.uri = "ftp://broker/sql".to_string();
        config.metric.name = "bad-name".to_string();
        config.metric.status_column = "type".to_string();
        config.labels.known_types = vec!["index".to_string(), "index".to_string()];

        match config.validate() {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors.len(), 4, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("druid.uri")));
                assert!(errors.iter().any(|e| e.contains("metric.name")));
                assert!(errors.iter().any(|e| e.contains("task type label")));
                assert!(errors.iter().any(|e| e.contains("more than once")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_sql_injection_in_status_column_rejected() {
        let mut config = ExporterConfig::default();
        config.metric.status_column = "status FROM x; --".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_lists_only_matter_with_zero_fill() {
        let mut config = ExporterConfig::default();
        config.labels.known_types.clear();
        assert!(config.validate().is_err());

        config.labels.zero_fill = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_keeps_values() {
        let mut config = ExporterConfig::default();
        config.server.listen_address = ":9100".to_string();
        let text = config.to_toml().unwrap();
        let parsed = ExporterConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.server.listen_address, ":9100");
        assert!(parsed.labels.known_statuses.is_none());
    }
}
