//! Test session controller
//!
//! Drives one visual test through its lifecycle:
//!
//! ```text
//! Closed ──open()──▶ Open ──check_window()──▶ SessionStarted
//!   ▲                  │                            │
//!   └──── close() / abort_if_not_closed() ◀────────┘
//! ```
//!
//! The remote session is started lazily by the first checkpoint. When the
//! controller is disabled every operation succeeds without doing anything.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use vizcheck_common::{
    AppEnvironment, AppOutput, BatchInfo, Error, ExactMatchSettings, FailureReportMode, Location,
    MatchLevel, MatchResult, MatchWindowData, MouseAction, Region, RectangleSize, Result,
    RunningSession, SessionStartInfo, TestResults, Trigger,
};

use crate::classifier::classify;
use crate::config::SessionConfig;
use crate::connector::ServerConnector;
use crate::driver::AppDriver;
use crate::match_task::{MatchProtocol, MatchRequest, MatchWindowTask, MINIMUM_MATCH_TIMEOUT};
use crate::reporter::build_test_error;
use crate::triggers::TriggerRecorder;

/// State of the test currently driven by a controller
#[derive(Debug, Default)]
struct TestSession {
    is_open: bool,
    app_name: String,
    test_name: String,
    /// Requested viewport, replaced by the actual one once the session starts
    viewport_size: Option<RectangleSize>,
    session_start_info: Option<SessionStartInfo>,
    running_session: Option<RunningSession>,
    triggers: TriggerRecorder,
    /// Wait the whole timeout and compare once on the next checkpoint
    retry_once_on_timeout: bool,
}

/// Builds the match-retry protocol for one checkpoint from the running
/// session and the default retry timeout
pub type MatchProtocolFactory =
    Box<dyn Fn(RunningSession, Duration) -> Box<dyn MatchProtocol> + Send + Sync>;

/// Orchestrates one visual test at a time against a comparison service
pub struct SessionController {
    config: SessionConfig,
    connector: Arc<dyn ServerConnector>,
    driver: Arc<dyn AppDriver>,
    /// Replaces [`MatchWindowTask`] when set
    match_protocol: Option<MatchProtocolFactory>,
    session: TestSession,
}

impl SessionController {
    pub fn new(
        config: SessionConfig,
        connector: Arc<dyn ServerConnector>,
        driver: Arc<dyn AppDriver>,
    ) -> Self {
        Self {
            config,
            connector,
            driver,
            match_protocol: None,
            session: TestSession::default(),
        }
    }

    /// Use `factory` instead of [`MatchWindowTask`] to run checkpoints
    pub fn with_match_protocol<F>(mut self, factory: F) -> Self
    where
        F: Fn(RunningSession, Duration) -> Box<dyn MatchProtocol> + Send + Sync + 'static,
    {
        self.match_protocol = Some(Box::new(factory));
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Start a new test. The remote session is created by the first checkpoint.
    ///
    /// Opening while another test is open aborts that test and fails.
    pub async fn open(
        &mut self,
        app_name: &str,
        test_name: &str,
        viewport_size: Option<RectangleSize>,
    ) -> Result<()> {
        if self.config.is_disabled {
            debug!("open(): ignored (disabled)");
            return Ok(());
        }

        if self.api_key().is_none() {
            return Err(Error::Configuration(
                "API key is missing; configure the connector or set VIZCHECK_API_KEY".to_string(),
            ));
        }

        if self.session.is_open {
            warn!(
                "open() called while '{}' is running; aborting it",
                self.session.test_name
            );
            self.abort_if_not_closed().await;
            return Err(Error::State("A test is already running".to_string()));
        }

        info!("Opening test '{}' of '{}'", test_name, app_name);
        self.session = TestSession {
            is_open: true,
            app_name: app_name.to_string(),
            test_name: test_name.to_string(),
            viewport_size,
            ..TestSession::default()
        };
        Ok(())
    }

    /// Create the remote session if it does not exist yet
    pub async fn start_session(&mut self) -> Result<()> {
        if self.config.is_disabled {
            debug!("start_session(): ignored (disabled)");
            return Ok(());
        }
        self.ensure_open("start_session")?;

        if self.session.running_session.is_some() {
            return Ok(());
        }

        let display_size = match self.session.viewport_size {
            Some(size) => {
                debug!("Setting viewport size to {}", size);
                self.driver.set_viewport_size(size).await?;
                size
            }
            None => self.driver.viewport_size().await?,
        };
        self.session.viewport_size = Some(display_size);

        let batch = self
            .config
            .batch
            .get_or_insert_with(BatchInfo::default)
            .clone();

        let info = SessionStartInfo {
            agent_id: self.full_agent_id(),
            app_id_or_name: self.session.app_name.clone(),
            scenario_id_or_name: self.session.test_name.clone(),
            batch_info: batch,
            environment: AppEnvironment {
                os: self.config.host_os.clone(),
                hosting_app: self.config.host_app.clone(),
                display_size,
                inferred: self.driver.inferred_environment(),
            },
            default_match_settings: self.config.default_match_settings,
            branch_name: self.config.branch_name.clone(),
            parent_branch_name: self.config.parent_branch_name.clone(),
        };

        info!(
            "Starting session for '{}' in batch {}",
            info.scenario_id_or_name,
            info.batch_info.display()
        );
        let running = self.connector.start_session(&info).await?;
        info!(
            "Session {} started (new: {}) - {}",
            running.id, running.is_new_session, running.url
        );

        // A new test has no baseline; its first mismatch is expected
        self.session.retry_once_on_timeout = running.is_new_session;
        self.session.session_start_info = Some(info);
        self.session.running_session = Some(running);
        Ok(())
    }

    /// Compare the current window against the baseline.
    ///
    /// Returns the raw match result; `None` when disabled. With
    /// [`FailureReportMode::Immediate`] a mismatch fails the call.
    pub async fn check_window(
        &mut self,
        tag: Option<&str>,
        ignore_mismatch: bool,
        retry_timeout: Option<Duration>,
        region: Option<Region>,
    ) -> Result<Option<MatchResult>> {
        if self.config.is_disabled {
            debug!("check_window({:?}): ignored (disabled)", tag);
            return Ok(None);
        }
        self.ensure_open("check_window")?;
        self.start_session().await?;

        let running = self
            .session
            .running_session
            .clone()
            .ok_or_else(|| Error::State("No running session after start".to_string()))?;

        debug!("check_window({:?})", tag);
        let mut task = self.match_task(running.clone());
        let outcome = task
            .match_window(MatchRequest {
                user_inputs: self.session.triggers.pending(),
                region,
                tag,
                force_full_retry: self.session.retry_once_on_timeout,
                ignore_mismatch,
                timeout: retry_timeout,
            })
            .await;

        if let Some(bounds) = task.last_screenshot_bounds() {
            self.session.triggers.set_reference_bounds(Some(bounds));
        }
        if !ignore_mismatch {
            self.session.triggers.clear();
        }

        let result = outcome?;
        if result.as_expected {
            return Ok(Some(result));
        }

        warn!(
            "Mismatch found in '{}' of '{}'",
            tag.unwrap_or_default(),
            self.session.test_name
        );
        self.session.retry_once_on_timeout = true;

        if self.config.failure_report_mode == FailureReportMode::Immediate {
            let results = TestResults {
                test_name: self.session.test_name.clone(),
                app_name: self.session.app_name.clone(),
                is_new: running.is_new_session,
                session_id: Some(running.id.clone()),
                legacy_session_id: running.legacy_session_id.clone(),
                url: Some(running.url.clone()),
                is_passed: false,
                immediate_mismatch: Some(true),
                ..Default::default()
            };
            if let Some(failure) = build_test_error(&results) {
                return Err(failure.into());
            }
        }

        Ok(Some(result))
    }

    /// End the test and return its results; `None` when disabled.
    ///
    /// With `throw_ex` a test that did not pass fails the call.
    pub async fn close(&mut self, throw_ex: bool) -> Result<Option<TestResults>> {
        if self.config.is_disabled {
            debug!("close(): ignored (disabled)");
            return Ok(None);
        }
        self.ensure_open("close")?;

        self.session.is_open = false;
        self.session.triggers.clear();

        let Some(running) = self.session.running_session.take() else {
            info!("Closing '{}': no session was started", self.session.test_name);
            return Ok(Some(classify(
                &self.session.test_name,
                &self.session.app_name,
                None,
                None,
                false,
                false,
            )));
        };

        let is_new = running.is_new_session;
        let save = (is_new && self.config.save_new_tests) || (!is_new && self.config.save_failed_tests);

        info!("Ending session {} (save: {})", running.id, save);
        let stats = self.connector.end_session(&running, false, save).await?;
        let results = classify(
            &self.session.test_name,
            &self.session.app_name,
            Some(&running),
            Some(&stats),
            save,
            false,
        );

        if results.is_passed {
            info!("Test '{}' passed - {}", results.test_name, running.url);
            return Ok(Some(results));
        }

        warn!(
            "Test '{}' did not pass: {} mismatches, {} missing (new: {}) - {}",
            results.test_name, results.mismatches, results.missing, results.is_new, running.url
        );
        if throw_ex {
            if let Some(failure) = build_test_error(&results) {
                return Err(failure.into());
            }
        }
        Ok(Some(results))
    }

    /// Abort the open test, if any. Never fails.
    ///
    /// Returns `None` when disabled or when no test is open.
    pub async fn abort_if_not_closed(&mut self) -> Option<TestResults> {
        if self.config.is_disabled || !self.session.is_open {
            return None;
        }

        self.session.is_open = false;
        self.session.triggers.clear();

        let test_name = self.session.test_name.clone();
        let app_name = self.session.app_name.clone();

        let Some(running) = self.session.running_session.take() else {
            info!("Aborting '{}': no session was started", test_name);
            return Some(classify(&test_name, &app_name, None, None, false, true));
        };

        info!("Aborting session {}", running.id);
        let stats = match self.connector.end_session(&running, true, false).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                warn!("Failed to abort session {}: {}", running.id, e);
                None
            }
        };

        Some(classify(
            &test_name,
            &app_name,
            Some(&running),
            stats.as_ref(),
            false,
            true,
        ))
    }

    /// Replace the screenshot of an already recorded step
    pub async fn replace_window(
        &mut self,
        step_index: u32,
        image: Vec<u8>,
        tag: &str,
        title: &str,
        user_inputs: Vec<Trigger>,
    ) -> Result<Option<MatchResult>> {
        if self.config.is_disabled {
            debug!("replace_window({}): ignored (disabled)", step_index);
            return Ok(None);
        }
        self.ensure_open("replace_window")?;

        let running = self
            .session
            .running_session
            .as_ref()
            .ok_or_else(|| Error::State("No running session to replace a step in".to_string()))?;

        let data = MatchWindowData {
            user_inputs,
            app_output: AppOutput {
                title: title.to_string(),
                screenshot64: String::new(),
            },
            tag: Some(tag.to_string()),
            ignore_mismatch: false,
        };

        debug!("Replacing step {} of session {}", step_index, running.id);
        let result = self
            .connector
            .replace_window(running, step_index, &data, image)
            .await?;
        Ok(Some(result))
    }

    // ========================================================================
    // Triggers
    // ========================================================================

    /// Record a keyboard event for the next checkpoint. Returns whether it was queued.
    pub fn add_keyboard_trigger(&mut self, control: Region, text: &str) -> bool {
        if self.config.is_disabled || !self.session.is_open {
            return false;
        }
        self.session.triggers.add_keyboard_trigger(control, text)
    }

    /// Record a mouse event for the next checkpoint. `cursor` is relative to
    /// `control`. Returns whether it was queued.
    pub fn add_mouse_trigger(&mut self, action: MouseAction, control: Region, cursor: Location) -> bool {
        if self.config.is_disabled || !self.session.is_open {
            return false;
        }
        self.session.triggers.add_mouse_trigger(action, control, cursor)
    }

    pub fn pending_inputs(&self) -> &[Trigger] {
        self.session.triggers.pending()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn is_open(&self) -> bool {
        self.session.is_open
    }

    pub fn app_name(&self) -> &str {
        &self.session.app_name
    }

    pub fn test_name(&self) -> &str {
        &self.session.test_name
    }

    /// Viewport requested at open, or the actual one once the session started
    pub fn viewport_size(&self) -> Option<RectangleSize> {
        self.session.viewport_size
    }

    pub fn running_session(&self) -> Option<&RunningSession> {
        self.session.running_session.as_ref()
    }

    pub fn session_start_info(&self) -> Option<&SessionStartInfo> {
        self.session.session_start_info.as_ref()
    }

    pub fn retry_once_on_timeout(&self) -> bool {
        self.session.retry_once_on_timeout
    }

    /// Bounds of the last screenshot taken, if any
    pub fn last_screenshot_bounds(&self) -> Option<Region> {
        self.session.triggers.reference_bounds()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Agent id reported to the service: `"<user id> [<sdk id>]"`, or the
    /// SDK id alone
    pub fn full_agent_id(&self) -> String {
        let base = self.driver.base_agent_id();
        match &self.config.agent_id {
            Some(agent_id) => format!("{} [{}]", agent_id, base),
            None => base,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.config.is_disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.config.is_disabled = disabled;
    }

    pub fn batch(&self) -> Option<&BatchInfo> {
        self.config.batch.as_ref()
    }

    pub fn set_batch(&mut self, batch: BatchInfo) {
        self.config.batch = Some(batch);
    }

    pub fn set_agent_id(&mut self, agent_id: Option<String>) {
        self.config.agent_id = agent_id;
    }

    /// Set the default retry timeout; must be zero or at least 60 ms
    pub fn set_match_timeout(&mut self, timeout: Duration) -> Result<()> {
        if !timeout.is_zero() && timeout < MINIMUM_MATCH_TIMEOUT {
            return Err(Error::InvalidArgument(format!(
                "Match timeout must be 0 or at least {} ms",
                MINIMUM_MATCH_TIMEOUT.as_millis()
            )));
        }
        self.config.match_timeout_ms = timeout.as_millis() as u64;
        Ok(())
    }

    pub fn match_timeout(&self) -> Duration {
        self.config.match_timeout()
    }

    pub fn set_match_level(&mut self, level: MatchLevel) {
        self.config.default_match_settings.match_level = level;
    }

    pub fn set_exact_match_settings(&mut self, exact: Option<ExactMatchSettings>) {
        self.config.default_match_settings.exact = exact;
    }

    pub fn set_failure_report_mode(&mut self, mode: FailureReportMode) {
        self.config.failure_report_mode = mode;
    }

    pub fn set_save_new_tests(&mut self, save: bool) {
        self.config.save_new_tests = save;
    }

    pub fn set_save_failed_tests(&mut self, save: bool) {
        self.config.save_failed_tests = save;
    }

    pub fn set_branch_name(&mut self, name: Option<String>) {
        self.config.branch_name = name;
    }

    pub fn set_parent_branch_name(&mut self, name: Option<String>) {
        self.config.parent_branch_name = name;
    }

    pub fn set_host_os(&mut self, os: Option<String>) {
        self.config.host_os = os;
    }

    pub fn set_host_app(&mut self, app: Option<String>) {
        self.config.host_app = app;
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn api_key(&self) -> Option<String> {
        self.connector.api_key().or_else(|| self.config.api_key.clone())
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.session.is_open {
            Ok(())
        } else {
            Err(Error::State(format!("{}() called with no open test", operation)))
        }
    }

    fn match_task(&self, running: RunningSession) -> Box<dyn MatchProtocol> {
        let timeout = self.config.match_timeout();
        match &self.match_protocol {
            Some(factory) => factory(running, timeout),
            None => Box::new(MatchWindowTask::new(
                self.connector.clone(),
                self.driver.clone(),
                running,
                timeout,
            )),
        }
    }
}
