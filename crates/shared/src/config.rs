//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Periodic task intervals.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Approval workflow settings.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Team-conflict detection settings.
    #[serde(default)]
    pub conflict: ConflictConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Optional JSON policy catalog to seed at startup.
    #[serde(default)]
    pub catalog_path: Option<String>,
}

/// Periodic task intervals.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between escalation scans.
    #[serde(default = "default_escalation_interval")]
    pub escalation_interval_secs: u64,
    /// Seconds between accrual/rollover/expiry runs.
    #[serde(default = "default_accrual_interval")]
    pub accrual_interval_secs: u64,
    /// Seconds between completion sweeps.
    #[serde(default = "default_completion_interval")]
    pub completion_interval_secs: u64,
}

fn default_escalation_interval() -> u64 {
    300
}

fn default_accrual_interval() -> u64 {
    3600
}

fn default_completion_interval() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            escalation_interval_secs: default_escalation_interval(),
            accrual_interval_secs: default_accrual_interval(),
            completion_interval_secs: default_completion_interval(),
        }
    }
}

/// Approval workflow settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Escalation window for levels that do not set their own.
    #[serde(default = "default_escalation_hours")]
    pub default_escalation_hours: u32,
    /// Attempts for a compare-and-swap write before giving up with a conflict.
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,
    /// Whether a rejection must carry a comment.
    #[serde(default = "default_true")]
    pub require_rejection_comment: bool,
}

fn default_escalation_hours() -> u32 {
    48
}

fn default_max_write_retries() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_escalation_hours: default_escalation_hours(),
            max_write_retries: default_max_write_retries(),
            require_rejection_comment: true,
        }
    }
}

/// Which colleagues count as the requester's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamScope {
    /// Everyone in the same department.
    #[default]
    Department,
    /// Same department and same position.
    DepartmentAndPosition,
}

/// Team-conflict detection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictConfig {
    /// Team membership rule.
    #[serde(default)]
    pub team_scope: TeamScope,
    /// Share of the team (percent) allowed off at once, requester included.
    #[serde(default = "default_max_concurrent_percent")]
    pub max_concurrent_percent: Decimal,
    /// Optional hard cap on concurrent absences, requester included.
    #[serde(default)]
    pub max_concurrent_absolute: Option<u32>,
    /// Teams smaller than this never raise a team conflict.
    #[serde(default = "default_min_team_size")]
    pub min_team_size: u32,
}

fn default_max_concurrent_percent() -> Decimal {
    Decimal::from(30)
}

fn default_min_team_size() -> u32 {
    2
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            team_scope: TeamScope::default(),
            max_concurrent_percent: default_max_concurrent_percent(),
            max_concurrent_absolute: None,
            min_team_size: default_min_team_size(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FURLOUGH").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
