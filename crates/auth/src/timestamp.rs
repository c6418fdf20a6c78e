use common::errors::AuthError;

/// Maximum age or future skew of a request timestamp, in seconds.
pub const TIMESTAMP_WINDOW_SECS: i64 = 300;

/// Bounds the request timestamp to ±[`TIMESTAMP_WINDOW_SECS`] of `now`
/// (both unix seconds). Stale and future are distinct variants internally;
/// the wire sees one generic rejection either way.
pub fn check_freshness(timestamp: i64, now: i64) -> Result<(), AuthError> {
    if now - timestamp > TIMESTAMP_WINDOW_SECS {
        return Err(AuthError::StaleTimestamp);
    }
    if timestamp - now > TIMESTAMP_WINDOW_SECS {
        return Err(AuthError::FutureTimestamp);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn accepts_inside_window_including_edges() {
        assert!(check_freshness(NOW, NOW).is_ok());
        assert!(check_freshness(NOW - TIMESTAMP_WINDOW_SECS, NOW).is_ok());
        assert!(check_freshness(NOW + TIMESTAMP_WINDOW_SECS, NOW).is_ok());
    }

    #[test]
    fn rejects_stale() {
        assert!(matches!(
            check_freshness(NOW - TIMESTAMP_WINDOW_SECS - 1, NOW),
            Err(AuthError::StaleTimestamp)
        ));
    }

    #[test]
    fn rejects_future() {
        assert!(matches!(
            check_freshness(NOW + TIMESTAMP_WINDOW_SECS + 1, NOW),
            Err(AuthError::FutureTimestamp)
        ));
    }

    #[test]
    fn stale_and_future_share_one_public_message() {
        let stale = check_freshness(NOW - 301, NOW).unwrap_err();
        let future = check_freshness(NOW + 301, NOW).unwrap_err();
        assert_eq!(stale.public_message(), future.public_message());
    }
}
