//! Classification of end-of-session data into test results

use vizcheck_common::{RunningSession, SessionEndStats, TestResults};

/// Build the final results of a test.
///
/// Without a running session the test never reached the service and the
/// neutral result is returned. A missing `stats` payload counts as all zeros.
pub fn classify(
    test_name: &str,
    app_name: &str,
    session: Option<&RunningSession>,
    stats: Option<&SessionEndStats>,
    is_saved: bool,
    is_aborted: bool,
) -> TestResults {
    let Some(session) = session else {
        return TestResults::neutral(test_name, app_name, is_aborted);
    };

    let stats = stats.copied().unwrap_or_default();
    let is_new = session.is_new_session;

    TestResults {
        test_name: test_name.to_string(),
        app_name: app_name.to_string(),
        steps: stats.steps,
        matches: stats.matches,
        mismatches: stats.mismatches,
        missing: stats.missing,
        exact_matches: stats.exact_matches,
        strict_matches: stats.strict_matches,
        content_matches: stats.content_matches,
        layout_matches: stats.layout_matches,
        none_matches: stats.none_matches,
        is_new,
        session_id: Some(session.id.clone()),
        legacy_session_id: session.legacy_session_id.clone(),
        url: Some(session.url.clone()),
        is_passed: TestResults::compute_passed(is_aborted, is_new, stats.mismatches, stats.missing),
        is_aborted,
        is_saved,
        immediate_mismatch: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(is_new: bool) -> RunningSession {
        RunningSession {
            id: "s-1".to_string(),
            legacy_session_id: Some("legacy-1".to_string()),
            is_new_session: is_new,
            url: "https://vizcheck.local/sessions/s-1".to_string(),
        }
    }

    #[test]
    fn test_no_session_is_neutral() {
        let r = classify("T", "A", None, None, false, false);
        assert!(r.is_passed);
        assert!(!r.is_aborted);
        assert!(r.session_id.is_none());
        assert_eq!(r.steps, 0);
    }

    #[test]
    fn test_clean_existing_session_passes() {
        let stats = SessionEndStats {
            steps: 3,
            matches: 3,
            strict_matches: 3,
            ..Default::default()
        };
        let r = classify("T", "A", Some(&session(false)), Some(&stats), false, false);
        assert!(r.is_passed);
        assert_eq!(r.steps, 3);
        assert_eq!(r.strict_matches, 3);
        assert_eq!(r.session_id.as_deref(), Some("s-1"));
        assert_eq!(r.legacy_session_id.as_deref(), Some("legacy-1"));
    }

    #[test]
    fn test_mismatch_or_missing_fails() {
        let mismatched = SessionEndStats {
            mismatches: 1,
            ..Default::default()
        };
        let missing = SessionEndStats {
            missing: 2,
            ..Default::default()
        };
        assert!(!classify("T", "A", Some(&session(false)), Some(&mismatched), false, false).is_passed);
        assert!(!classify("T", "A", Some(&session(false)), Some(&missing), false, false).is_passed);
    }

    #[test]
    fn test_new_session_never_passes() {
        let r = classify("T", "A", Some(&session(true)), None, true, false);
        assert!(r.is_new);
        assert!(r.is_saved);
        assert!(!r.is_passed);
    }

    #[test]
    fn test_aborted_never_passes() {
        let r = classify("T", "A", Some(&session(false)), None, false, true);
        assert!(r.is_aborted);
        assert!(!r.is_passed);
    }

    #[test]
    fn test_passed_formula_holds() {
        for is_new in [false, true] {
            for is_aborted in [false, true] {
                for (mismatches, missing) in [(0, 0), (1, 0), (0, 1)] {
                    let stats = SessionEndStats {
                        mismatches,
                        missing,
                        ..Default::default()
                    };
                    let r = classify("T", "A", Some(&session(is_new)), Some(&stats), false, is_aborted);
                    assert_eq!(
                        r.is_passed,
                        !r.is_aborted && !r.is_new && r.mismatches == 0 && r.missing == 0
                    );
                }
            }
        }
    }
}
