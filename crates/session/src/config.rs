//! Session configuration
//!
//! Loaded from a TOML file, then optionally overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `VIZCHECK_API_KEY` | `api_key` |
//! | `VIZCHECK_DISABLED` | `is_disabled` |
//! | `VIZCHECK_BATCH_ID` | `batch.id` |
//! | `VIZCHECK_BATCH_NAME` | `batch.name` |
//! | `VIZCHECK_BRANCH` | `branch_name` |
//! | `VIZCHECK_PARENT_BRANCH` | `parent_branch_name` |

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vizcheck_common::{BatchInfo, FailureReportMode, ImageMatchSettings, Result};

use crate::match_task::DEFAULT_MATCH_TIMEOUT;

pub const ENV_API_KEY: &str = "VIZCHECK_API_KEY";
pub const ENV_DISABLED: &str = "VIZCHECK_DISABLED";
pub const ENV_BATCH_ID: &str = "VIZCHECK_BATCH_ID";
pub const ENV_BATCH_NAME: &str = "VIZCHECK_BATCH_NAME";
pub const ENV_BRANCH: &str = "VIZCHECK_BRANCH";
pub const ENV_PARENT_BRANCH: &str = "VIZCHECK_PARENT_BRANCH";

/// Settings shared by every test run through one controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fallback credentials when the connector carries none
    pub api_key: Option<String>,

    /// Turn every operation into a no-op
    pub is_disabled: bool,

    /// User-supplied agent id, prefixed to the SDK's own id
    pub agent_id: Option<String>,

    /// Overrides the OS reported in the environment descriptor
    pub host_os: Option<String>,

    /// Overrides the hosting application reported in the environment descriptor
    pub host_app: Option<String>,

    /// Batch to report tests under; generated on first use when unset
    pub batch: Option<BatchInfo>,

    pub branch_name: Option<String>,

    pub parent_branch_name: Option<String>,

    /// Save the screenshots of a brand-new test as its baseline
    pub save_new_tests: bool,

    /// Save the screenshots of a failed test as the new baseline
    pub save_failed_tests: bool,

    pub failure_report_mode: FailureReportMode,

    /// Default retry timeout of a checkpoint, in milliseconds
    pub match_timeout_ms: u64,

    pub default_match_settings: ImageMatchSettings,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            is_disabled: false,
            agent_id: None,
            host_os: None,
            host_app: None,
            batch: None,
            branch_name: None,
            parent_branch_name: None,
            save_new_tests: true,
            save_failed_tests: false,
            failure_report_mode: FailureReportMode::OnClose,
            match_timeout_ms: DEFAULT_MATCH_TIMEOUT.as_millis() as u64,
            default_match_settings: ImageMatchSettings::default(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, a variable-name to value function
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(disabled) = lookup(ENV_DISABLED) {
            self.is_disabled = matches!(disabled.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }

        let batch_id = lookup(ENV_BATCH_ID);
        let batch_name = lookup(ENV_BATCH_NAME);
        if batch_id.is_some() || batch_name.is_some() {
            let mut batch = self.batch.take().unwrap_or_default();
            if let Some(id) = batch_id {
                batch.id = id;
            }
            if let Some(name) = batch_name {
                batch.name = Some(name);
            }
            self.batch = Some(batch);
        }

        if let Some(branch) = lookup(ENV_BRANCH) {
            self.branch_name = Some(branch);
        }
        if let Some(parent) = lookup(ENV_PARENT_BRANCH) {
            self.parent_branch_name = Some(parent);
        }
        self
    }

    /// Default retry timeout of a checkpoint
    pub fn match_timeout(&self) -> Duration {
        Duration::from_millis(self.match_timeout_ms)
    }
}
