//! Error types for vizcheck

use thiserror::Error;

use crate::types::TestResults;

/// Result type alias using vizcheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// vizcheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    State(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    TestFailed(Box<TestFailure>),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl Error {
    /// The results attached to a comparison failure, if any
    pub fn test_results(&self) -> Option<&TestResults> {
        match self {
            Error::TestFailed(failure) => Some(&failure.results),
            _ => None,
        }
    }
}

impl From<TestFailure> for Error {
    fn from(failure: TestFailure) -> Self {
        Error::TestFailed(Box::new(failure))
    }
}

/// Why a test is reported as not passed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A checkpoint mismatched and failures are reported immediately
    FailedImmediate,
    Aborted,
    /// The test had no baseline; its screenshots await review
    NewTest,
    Failed,
}

/// A comparison failure with the full result payload attached
#[derive(Debug, Clone, PartialEq)]
pub struct TestFailure {
    pub kind: FailureKind,
    pub results: TestResults,
}

impl TestFailure {
    pub fn new(kind: FailureKind, results: TestResults) -> Self {
        Self { kind, results }
    }
}

impl std::fmt::Display for TestFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let test = &self.results.test_name;
        let app = &self.results.app_name;
        let url = self.results.url.as_deref().unwrap_or("<no session url>");
        match self.kind {
            FailureKind::FailedImmediate => write!(
                f,
                "Test '{}' of '{}' detected differences! See details at: {}",
                test, app, url
            ),
            FailureKind::Aborted => write!(
                f,
                "Test '{}' of '{}' is aborted! See details at: {}",
                test, app, url
            ),
            FailureKind::NewTest => write!(
                f,
                "New test '{}' of '{}' ended! Please review the new baseline at: {}",
                test, app, url
            ),
            FailureKind::Failed => write!(
                f,
                "Test '{}' of '{}' failed! See details at: {}",
                test, app, url
            ),
        }
    }
}

impl std::error::Error for TestFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn results() -> TestResults {
        TestResults {
            test_name: "Login".to_string(),
            app_name: "Portal".to_string(),
            url: Some("https://vizcheck.local/app/sessions/42".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_failure_messages() {
        let failed = TestFailure::new(FailureKind::Failed, results());
        assert_eq!(
            failed.to_string(),
            "Test 'Login' of 'Portal' failed! See details at: https://vizcheck.local/app/sessions/42"
        );

        let new_test = TestFailure::new(FailureKind::NewTest, results());
        assert!(new_test.to_string().starts_with("New test 'Login' of 'Portal' ended!"));
    }

    #[test]
    fn test_failure_without_url() {
        let aborted = TestFailure::new(
            FailureKind::Aborted,
            TestResults {
                url: None,
                ..results()
            },
        );
        assert!(aborted.to_string().ends_with("<no session url>"));
    }

    #[test]
    fn test_results_attached_to_error() {
        let err: Error = TestFailure::new(FailureKind::FailedImmediate, results()).into();
        assert_eq!(err.test_results().map(|r| r.test_name.as_str()), Some("Login"));
        assert!(err.to_string().contains("detected differences"));
        assert!(Error::State("closed".to_string()).test_results().is_none());
    }
}
