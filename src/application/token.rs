//! # Token Validation
//!
//! Decides whether a `tokenTime<millis>` link is still inside the policy window.
//! Anything that cannot be trusted (missing, malformed or future timestamps) is expired.

/// State reached by a token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Outside the window or unparseable. No grant is written.
    Expired,
    /// Inside the window and a new grant was written.
    FreshUnseen,
    /// Inside the window and the user already held a grant.
    FreshSeen,
}

/// Whether a token issued at `issued_at` is fresh at `now`.
///
/// `window_ms = None` means expiration is disabled: any well-formed token
/// from the past is fresh.
pub fn is_fresh(issued_at: Option<i64>, now: i64, window_ms: Option<i64>) -> bool {
    let Some(issued_at) = issued_at else {
        return false;
    };
    let Some(elapsed) = now.checked_sub(issued_at) else {
        return false;
    };
    if elapsed < 0 {
        return false;
    }
    match window_ms {
        Some(window) => elapsed <= window,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;

    #[test]
    fn test_window_boundary() {
        let window = Some(24 * HOUR);
        assert!(is_fresh(Some(0), 24 * HOUR - 1, window));
        assert!(is_fresh(Some(0), 24 * HOUR, window));
        assert!(!is_fresh(Some(0), 24 * HOUR + 1, window));
    }

    #[test]
    fn test_malformed_is_expired() {
        assert!(!is_fresh(None, 1_000, Some(HOUR)));
        assert!(!is_fresh(None, 1_000, None));
    }

    #[test]
    fn test_future_timestamp_is_expired() {
        assert!(!is_fresh(Some(10_000), 5_000, Some(HOUR)));
        assert!(!is_fresh(Some(i64::MAX), 5_000, None));
    }

    #[test]
    fn test_no_overflow_on_extremes() {
        assert!(!is_fresh(Some(i64::MIN), i64::MAX, Some(HOUR)));
        assert!(!is_fresh(Some(0), i64::MAX, Some(HOUR)));
    }

    #[test]
    fn test_disabled_window() {
        assert!(is_fresh(Some(0), 100 * 24 * HOUR, None));
    }
}
