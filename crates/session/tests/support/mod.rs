//! In-memory collaborators for session tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use vizcheck_common::{
    Error, Location, MatchResult, MatchWindowData, Region, RectangleSize, Result, RunningSession,
    SessionEndStats, SessionStartInfo,
};
use vizcheck_session::{AppDriver, Screenshot, ServerConnector, SessionConfig, SessionController};

pub const BASE_AGENT_ID: &str = "vizcheck.test/1.0";
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) TestBrowser/1.0";
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// A call received by [`MockConnector`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartSession(SessionStartInfo),
    EndSession { is_aborted: bool, save: bool },
    MatchWindow(MatchWindowData),
    ReplaceWindow { step_index: u32, image: Vec<u8>, data: MatchWindowData },
}

pub struct MockConnector {
    pub api_key: Option<String>,
    pub is_new_session: bool,
    /// Outcomes of successive comparisons; `default_match` once exhausted
    pub match_results: Mutex<VecDeque<bool>>,
    pub default_match: bool,
    pub end_stats: SessionEndStats,
    pub fail_start_session: bool,
    pub fail_end_session: bool,
    /// Comparisons fail with a transport error while set
    pub fail_match_window: Mutex<bool>,
    pub calls: Mutex<Vec<Call>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            api_key: Some("test-key".to_string()),
            is_new_session: false,
            match_results: Mutex::new(VecDeque::new()),
            default_match: true,
            end_stats: SessionEndStats::default(),
            fail_start_session: false,
            fail_end_session: false,
            fail_match_window: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_session(mut self) -> Self {
        self.is_new_session = true;
        self
    }

    pub fn without_api_key(mut self) -> Self {
        self.api_key = None;
        self
    }

    pub fn matching(mut self, matches: bool) -> Self {
        self.default_match = matches;
        self
    }

    pub fn with_match_sequence(self, results: &[bool]) -> Self {
        self.match_results.lock().extend(results.iter().copied());
        self
    }

    pub fn with_end_stats(mut self, stats: SessionEndStats) -> Self {
        self.end_stats = stats;
        self
    }

    pub fn failing_end_session(mut self) -> Self {
        self.fail_end_session = true;
        self
    }

    pub fn failing_start_session(mut self) -> Self {
        self.fail_start_session = true;
        self
    }

    pub fn set_match_window_failing(&self, failing: bool) {
        *self.fail_match_window.lock() = failing;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn match_calls(&self) -> Vec<MatchWindowData> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::MatchWindow(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn end_calls(&self) -> Vec<(bool, bool)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::EndSession { is_aborted, save } => Some((*is_aborted, *save)),
                _ => None,
            })
            .collect()
    }

    pub fn running_session(&self) -> RunningSession {
        RunningSession {
            id: "session-1".to_string(),
            legacy_session_id: None,
            is_new_session: self.is_new_session,
            url: "https://vizcheck.local/app/sessions/session-1".to_string(),
        }
    }
}

#[async_trait]
impl ServerConnector for MockConnector {
    fn api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    async fn start_session(&self, info: &SessionStartInfo) -> Result<RunningSession> {
        self.calls.lock().push(Call::StartSession(info.clone()));
        if self.fail_start_session {
            return Err(Error::Transport("connection refused".to_string()));
        }
        Ok(self.running_session())
    }

    async fn end_session(
        &self,
        _session: &RunningSession,
        is_aborted: bool,
        save: bool,
    ) -> Result<SessionEndStats> {
        self.calls.lock().push(Call::EndSession { is_aborted, save });
        if self.fail_end_session {
            return Err(Error::Transport("connection reset".to_string()));
        }
        Ok(self.end_stats)
    }

    async fn match_window(
        &self,
        _session: &RunningSession,
        data: &MatchWindowData,
    ) -> Result<MatchResult> {
        self.calls.lock().push(Call::MatchWindow(data.clone()));
        if *self.fail_match_window.lock() {
            return Err(Error::Transport("comparison timed out".to_string()));
        }
        let as_expected = self.match_results.lock().pop_front().unwrap_or(self.default_match);
        Ok(MatchResult { as_expected })
    }

    async fn replace_window(
        &self,
        _session: &RunningSession,
        step_index: u32,
        data: &MatchWindowData,
        image: Vec<u8>,
    ) -> Result<MatchResult> {
        self.calls.lock().push(Call::ReplaceWindow {
            step_index,
            image,
            data: data.clone(),
        });
        Ok(MatchResult { as_expected: true })
    }
}

pub struct MockDriver {
    pub viewport: Mutex<RectangleSize>,
    pub origin: Location,
    pub resized_to: Mutex<Vec<RectangleSize>>,
    pub title: String,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self {
            viewport: Mutex::new(RectangleSize::new(1024, 768)),
            origin: Location::new(0, 0),
            resized_to: Mutex::new(Vec::new()),
            title: "Test Page".to_string(),
        }
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Screenshots start at `origin` instead of the viewport corner
    pub fn with_origin(mut self, origin: Location) -> Self {
        self.origin = origin;
        self
    }
}

#[async_trait]
impl AppDriver for MockDriver {
    async fn screenshot(&self, region: Option<Region>) -> Result<Screenshot> {
        let bounds = region.unwrap_or_else(|| Region::from_parts(self.origin, *self.viewport.lock()));
        Ok(Screenshot {
            image: PNG_BYTES.to_vec(),
            bounds,
        })
    }

    async fn title(&self) -> Result<String> {
        Ok(self.title.clone())
    }

    async fn viewport_size(&self) -> Result<RectangleSize> {
        Ok(*self.viewport.lock())
    }

    async fn set_viewport_size(&self, size: RectangleSize) -> Result<()> {
        *self.viewport.lock() = size;
        self.resized_to.lock().push(size);
        Ok(())
    }

    fn inferred_environment(&self) -> Option<String> {
        Some(USER_AGENT.to_string())
    }

    fn base_agent_id(&self) -> String {
        BASE_AGENT_ID.to_string()
    }
}

/// Controller wired to the given mocks, with a zero match timeout
pub fn controller(
    config: SessionConfig,
    connector: &Arc<MockConnector>,
    driver: &Arc<MockDriver>,
) -> SessionController {
    let config = SessionConfig {
        match_timeout_ms: 0,
        ..config
    };
    SessionController::new(config, connector.clone(), driver.clone())
}

pub fn init_logging() {
    vizcheck_session::logging::init(true);
}
