//! Comparison service interface
//!
//! The transport to the remote service lives outside this crate; the session
//! controller only talks to it through [`ServerConnector`].

use async_trait::async_trait;
use vizcheck_common::{
    MatchResult, MatchWindowData, Result, RunningSession, SessionEndStats, SessionStartInfo,
};

/// Client of the remote comparison service
#[async_trait]
pub trait ServerConnector: Send + Sync {
    /// Credentials used to authenticate against the service
    fn api_key(&self) -> Option<String>;

    /// Create a remote session, or reuse an existing one with the same identity
    async fn start_session(&self, info: &SessionStartInfo) -> Result<RunningSession>;

    /// End a remote session and return its counters
    async fn end_session(
        &self,
        session: &RunningSession,
        is_aborted: bool,
        save: bool,
    ) -> Result<SessionEndStats>;

    /// Compare one screenshot against the baseline
    async fn match_window(
        &self,
        session: &RunningSession,
        data: &MatchWindowData,
    ) -> Result<MatchResult>;

    /// Replace the screenshot of an already recorded step
    async fn replace_window(
        &self,
        session: &RunningSession,
        step_index: u32,
        data: &MatchWindowData,
        image: Vec<u8>,
    ) -> Result<MatchResult>;
}
