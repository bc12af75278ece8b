//! Core types for vizcheck

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Location, Region, RectangleSize};

// ============================================================================
// Session configuration records
// ============================================================================

/// A named grouping of test runs for aggregate reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInfo {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl BatchInfo {
    /// Create a batch with a fresh id, started now
    pub fn new(name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            started_at: Utc::now(),
        }
    }

    /// Replace the generated id, e.g. to share a batch across processes
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Human-readable form: `name [id] - startedAt`, or `[id] - startedAt`
    /// for an unnamed batch
    pub fn display(&self) -> String {
        let started_at = self.started_at.to_rfc3339();
        match &self.name {
            Some(name) => format!("{} [{}] - {}", name, self.id, started_at),
            None => format!("[{}] - {}", self.id, started_at),
        }
    }
}

impl Default for BatchInfo {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Strictness policy used by the comparison service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchLevel {
    None,
    Layout,
    Content,
    Strict,
    Exact,
}

impl Default for MatchLevel {
    fn default() -> Self {
        Self::Strict
    }
}

impl std::fmt::Display for MatchLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchLevel::None => write!(f, "None"),
            MatchLevel::Layout => write!(f, "Layout"),
            MatchLevel::Content => write!(f, "Content"),
            MatchLevel::Strict => write!(f, "Strict"),
            MatchLevel::Exact => write!(f, "Exact"),
        }
    }
}

/// Thresholds applied when the match level is [`MatchLevel::Exact`]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactMatchSettings {
    pub min_diff_intensity: u32,
    pub min_diff_width: u32,
    pub min_diff_height: u32,
    pub match_threshold: f64,
}

/// Test-wide default comparison settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMatchSettings {
    #[serde(default)]
    pub match_level: MatchLevel,
    #[serde(default)]
    pub exact: Option<ExactMatchSettings>,
}

/// How comparison failures are surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReportMode {
    /// Reject the `check_window` call that saw the mismatch
    Immediate,
    /// Judge the whole test when it is closed
    OnClose,
}

impl Default for FailureReportMode {
    fn default() -> Self {
        Self::OnClose
    }
}

// ============================================================================
// Session start / handle
// ============================================================================

/// Where the application under test is running
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEnvironment {
    pub os: Option<String>,
    pub hosting_app: Option<String>,
    pub display_size: RectangleSize,
    pub inferred: Option<String>,
}

/// Descriptor sent to the service to create (or reuse) a remote session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartInfo {
    pub agent_id: String,
    pub app_id_or_name: String,
    pub scenario_id_or_name: String,
    pub batch_info: BatchInfo,
    pub environment: AppEnvironment,
    pub default_match_settings: ImageMatchSettings,
    pub branch_name: Option<String>,
    pub parent_branch_name: Option<String>,
}

/// Handle of a session tracked by the comparison service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningSession {
    pub id: String,
    #[serde(default)]
    pub legacy_session_id: Option<String>,
    pub is_new_session: bool,
    pub url: String,
}

// ============================================================================
// User input triggers
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseAction {
    Click,
    RightClick,
    DoubleClick,
    Move,
    Down,
    Up,
}

/// A recorded user-input event, in screenshot-relative coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "triggerType")]
pub enum Trigger {
    Text {
        control: Region,
        text: String,
    },
    Mouse {
        action: MouseAction,
        control: Region,
        location: Location,
    },
}

impl Trigger {
    pub fn control(&self) -> &Region {
        match self {
            Trigger::Text { control, .. } | Trigger::Mouse { control, .. } => control,
        }
    }
}

// ============================================================================
// Match payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOutput {
    pub title: String,
    /// Base64-encoded screenshot; empty when the image travels separately
    pub screenshot64: String,
}

/// One comparison request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchWindowData {
    pub user_inputs: Vec<Trigger>,
    pub app_output: AppOutput,
    pub tag: Option<String>,
    pub ignore_mismatch: bool,
}

/// Outcome of one comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub as_expected: bool,
}

/// Counters returned by the service when a session ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionEndStats {
    pub steps: u32,
    pub matches: u32,
    pub mismatches: u32,
    pub missing: u32,
    pub exact_matches: u32,
    pub strict_matches: u32,
    pub content_matches: u32,
    pub layout_matches: u32,
    pub none_matches: u32,
}

// ============================================================================
// Test results
// ============================================================================

/// Final outcome of one test
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub test_name: String,
    pub app_name: String,
    pub steps: u32,
    pub matches: u32,
    pub mismatches: u32,
    pub missing: u32,
    pub exact_matches: u32,
    pub strict_matches: u32,
    pub content_matches: u32,
    pub layout_matches: u32,
    pub none_matches: u32,
    pub is_new: bool,
    pub session_id: Option<String>,
    pub legacy_session_id: Option<String>,
    pub url: Option<String>,
    pub is_passed: bool,
    pub is_aborted: bool,
    pub is_saved: bool,
    /// Set only when a `check_window` call reports a mismatch immediately
    #[serde(skip)]
    pub immediate_mismatch: Option<bool>,
}

impl TestResults {
    /// Result of a test that never reached the service
    pub fn neutral(test_name: &str, app_name: &str, is_aborted: bool) -> Self {
        Self {
            test_name: test_name.to_string(),
            app_name: app_name.to_string(),
            is_aborted,
            is_passed: Self::compute_passed(is_aborted, false, 0, 0),
            ..Default::default()
        }
    }

    pub fn compute_passed(is_aborted: bool, is_new: bool, mismatches: u32, missing: u32) -> bool {
        !is_aborted && !is_new && mismatches == 0 && missing == 0
    }
}
