//! The version token shared by every replica.

use crate::error::{Result, SyncError};
use chrono::Utc;
use std::fmt;
use std::str::FromStr;

/// Opaque, totally ordered marker of one catalog save.
///
/// Tokens are compared only for change detection. Freshly minted tokens are
/// microseconds since the Unix epoch, but any integer is a valid token.
///
/// # Examples
///
/// ```rust
/// use catalog_sync::store::VersionToken;
///
/// let first = VersionToken::new(100);
/// let next = VersionToken::next_after(Some(first));
/// assert!(next > first);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionToken(i64);

impl VersionToken {
    /// Wrap a raw token value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw token value.
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Mint a token from the wall clock.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_micros())
    }

    /// Mint a token strictly greater than `previous`.
    ///
    /// Uses the wall clock when it is ahead of `previous`, otherwise
    /// `previous + 1`, so a coarse or skewed clock never produces a token that
    /// watchers would consider unchanged.
    pub fn next_after(previous: Option<VersionToken>) -> Self {
        let now = Self::now();
        match previous {
            Some(prev) if prev >= now => Self(prev.0.saturating_add(1)),
            _ => now,
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionToken {
    type Err = SyncError;

    /// Parse a stored token.
    ///
    /// Integers are taken as-is. Decimal values are legacy floating-point
    /// timestamps in seconds and are converted to microseconds.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<i64>() {
            return Ok(Self(value));
        }

        match trimmed.parse::<f64>() {
            Ok(secs) if secs.is_finite() => Ok(Self((secs * 1_000_000.0).round() as i64)),
            _ => Err(SyncError::InvalidToken(format!("'{}' is not a number", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_integer() {
        let token: VersionToken = "105".parse().unwrap();
        assert_eq!(token, VersionToken::new(105));
    }

    #[test]
    fn test_parse_legacy_float_seconds() {
        let token: VersionToken = "1700000000.25".parse().unwrap();
        assert_eq!(token.value(), 1_700_000_000_250_000);
    }

    #[test]
    fn test_parse_garbage() {
        assert!("".parse::<VersionToken>().is_err());
        assert!("abc".parse::<VersionToken>().is_err());
        assert!("NaN".parse::<VersionToken>().is_err());
    }

    #[test]
    fn test_next_after_absent_uses_clock() {
        let before = VersionToken::now();
        let token = VersionToken::next_after(None);
        assert!(token >= before);
    }

    #[test]
    fn test_next_after_future_token() {
        let far_future = VersionToken::new(i64::MAX - 10);
        assert_eq!(
            VersionToken::next_after(Some(far_future)),
            VersionToken::new(i64::MAX - 9)
        );
    }

    proptest! {
        #[test]
        fn next_after_is_strictly_greater(value in i64::MIN..i64::MAX) {
            let prev = VersionToken::new(value);
            prop_assert!(VersionToken::next_after(Some(prev)) > prev);
        }

        #[test]
        fn display_parses_back(value in any::<i64>()) {
            let token = VersionToken::new(value);
            prop_assert_eq!(token.to_string().parse::<VersionToken>().unwrap(), token);
        }
    }
}
