//! Turns test results into a structured failure

use vizcheck_common::{FailureKind, TestFailure, TestResults};

/// The failure a set of results represents, or `None` for a passing test.
///
/// An immediate mismatch takes priority over every other condition, including
/// an aborted session.
pub fn build_test_error(results: &TestResults) -> Option<TestFailure> {
    let kind = if results.immediate_mismatch == Some(true) {
        FailureKind::FailedImmediate
    } else if results.is_aborted {
        FailureKind::Aborted
    } else if results.is_new {
        FailureKind::NewTest
    } else if !results.is_passed && results.immediate_mismatch.is_none() {
        FailureKind::Failed
    } else {
        return None;
    };

    Some(TestFailure::new(kind, results.clone()))
}
