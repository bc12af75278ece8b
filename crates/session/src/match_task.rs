//! Match-retry protocol
//!
//! One task is built per checkpoint. It keeps asking the comparison service
//! whether the current screenshot matches the baseline until it does or the
//! retry timeout runs out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use tokio::time::Instant;
use tracing::debug;
use vizcheck_common::{
    AppOutput, MatchResult, MatchWindowData, Region, Result, RunningSession, Trigger,
};

use crate::connector::ServerConnector;
use crate::driver::AppDriver;

/// Pause between two comparison attempts
pub const MATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Smallest non-zero retry timeout accepted by the controller
pub const MINIMUM_MATCH_TIMEOUT: Duration = Duration::from_millis(60);

/// Default retry timeout for a checkpoint
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_millis(2000);

/// Arguments of one checkpoint comparison
#[derive(Debug, Clone)]
pub struct MatchRequest<'a> {
    pub user_inputs: &'a [Trigger],
    pub region: Option<Region>,
    pub tag: Option<&'a str>,
    /// Wait the whole timeout, then compare once
    pub force_full_retry: bool,
    pub ignore_mismatch: bool,
    /// Overrides the task's default timeout
    pub timeout: Option<Duration>,
}

/// Contract of the match-retry protocol
///
/// Implementations perform at least one comparison and return as soon as a
/// match is found or the timeout elapses.
#[async_trait]
pub trait MatchProtocol: Send {
    async fn match_window(&mut self, request: MatchRequest<'_>) -> Result<MatchResult>;

    /// Bounds of the screenshot used by the most recent attempt
    fn last_screenshot_bounds(&self) -> Option<Region>;
}

/// Polling implementation of [`MatchProtocol`]
pub struct MatchWindowTask {
    connector: Arc<dyn ServerConnector>,
    driver: Arc<dyn AppDriver>,
    running_session: RunningSession,
    default_timeout: Duration,
    last_bounds: Option<Region>,
}

impl MatchWindowTask {
    pub fn new(
        connector: Arc<dyn ServerConnector>,
        driver: Arc<dyn AppDriver>,
        running_session: RunningSession,
        default_timeout: Duration,
    ) -> Self {
        Self {
            connector,
            driver,
            running_session,
            default_timeout,
            last_bounds: None,
        }
    }

    /// Capture the application and run a single comparison
    async fn attempt(&mut self, request: &MatchRequest<'_>, ignore_mismatch: bool) -> Result<MatchResult> {
        let screenshot = self.driver.screenshot(request.region).await?;
        let title = self.driver.title().await?;
        self.last_bounds = Some(screenshot.bounds);

        let data = MatchWindowData {
            user_inputs: request.user_inputs.to_vec(),
            app_output: AppOutput {
                title,
                screenshot64: base64::engine::general_purpose::STANDARD.encode(&screenshot.image),
            },
            tag: request.tag.map(str::to_string),
            ignore_mismatch,
        };

        let result = self.connector.match_window(&self.running_session, &data).await?;
        debug!(
            "Match attempt for '{}': as_expected={}",
            request.tag.unwrap_or_default(),
            result.as_expected
        );
        Ok(result)
    }
}

#[async_trait]
impl MatchProtocol for MatchWindowTask {
    async fn match_window(&mut self, request: MatchRequest<'_>) -> Result<MatchResult> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        if timeout.is_zero() || request.force_full_retry {
            if request.force_full_retry {
                debug!("Waiting {:?} before a single comparison", timeout);
                tokio::time::sleep(timeout).await;
            }
            return self.attempt(&request, request.ignore_mismatch).await;
        }

        let start = Instant::now();
        // Intermediate attempts must not record a mismatch on the server
        let mut result = self.attempt(&request, true).await?;
        while !result.as_expected && start.elapsed() < timeout {
            tokio::time::sleep(MATCH_INTERVAL).await;
            result = self.attempt(&request, true).await?;
        }

        if !result.as_expected {
            debug!("No match after {:?}; sending final attempt", start.elapsed());
            result = self.attempt(&request, request.ignore_mismatch).await?;
        }

        Ok(result)
    }

    fn last_screenshot_bounds(&self) -> Option<Region> {
        self.last_bounds
    }
}
