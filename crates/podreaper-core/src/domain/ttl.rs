//! TTL policy - pod ごとの有効期限（annotation）の判定
//!
//! A workload opts into TTL expiry by carrying an RFC 3339 timestamp in the
//! expiry annotation. No annotation means no TTL policy. A malformed value is
//! treated like no annotation (fail open): the pod is never deleted because of
//! a typo, and the caller gets a `Malformed` result to log.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

/// Default annotation key carrying the expiry timestamp.
pub const DEFAULT_EXPIRY_ANNOTATION: &str = "podreaper.io/expires-at";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid expiry timestamp '{value}': {source}")]
pub struct TtlParseError {
    pub value: String,
    #[source]
    pub source: chrono::ParseError,
}

/// Parsed form of the expiry annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlPolicy {
    /// No annotation: only the window policy can delete this workload.
    None,
    ExpiresAt(DateTime<FixedOffset>),
}

impl TtlPolicy {
    /// Absent, empty and whitespace-only values all mean `TtlPolicy::None`.
    pub fn parse(value: Option<&str>) -> Result<Self, TtlParseError> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(TtlPolicy::None);
        };
        DateTime::parse_from_rfc3339(value)
            .map(TtlPolicy::ExpiresAt)
            .map_err(|source| TtlParseError {
                value: value.to_string(),
                source,
            })
    }
}

/// Result of checking one workload's TTL against `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryCheck {
    NoPolicy,
    Pending {
        expires_at: DateTime<FixedOffset>,
    },
    Expired {
        expires_at: DateTime<FixedOffset>,
        reason: String,
    },
    /// Unparseable annotation, treated as `NoPolicy`.
    Malformed(TtlParseError),
}

impl ExpiryCheck {
    pub fn is_expired(&self) -> bool {
        matches!(self, ExpiryCheck::Expired { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ExpiryCheck::Expired { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// Check an expiry annotation value against `now`.
///
/// Expired only when `now` is strictly after the timestamp.
pub fn check_expiry(annotation: Option<&str>, now: DateTime<Utc>) -> ExpiryCheck {
    let expires_at = match TtlPolicy::parse(annotation) {
        Ok(TtlPolicy::None) => return ExpiryCheck::NoPolicy,
        Ok(TtlPolicy::ExpiresAt(at)) => at,
        Err(e) => return ExpiryCheck::Malformed(e),
    };

    let overdue = now.signed_duration_since(expires_at);
    if overdue <= TimeDelta::zero() {
        return ExpiryCheck::Pending { expires_at };
    }

    ExpiryCheck::Expired {
        expires_at,
        reason: format!("expired {} ago", format_minutes(overdue)),
    }
}

/// Render a positive duration rounded to whole minutes, e.g. `24h0m`, `5m`.
fn format_minutes(d: TimeDelta) -> String {
    let minutes = (d.num_seconds() + 30) / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn scenario_one_day_overdue() {
        let check = check_expiry(Some("2024-01-01T00:00:00Z"), at(2024, 1, 2, 0, 0, 0));
        assert!(check.is_expired());
        assert_eq!(check.reason(), Some("expired 24h0m ago"));
    }

    #[rstest]
    #[case::none(None)]
    #[case::empty(Some(""))]
    #[case::blank(Some("   "))]
    fn missing_annotation_never_expires(#[case] value: Option<&str>) {
        let far_future = at(2999, 1, 1, 0, 0, 0);
        assert_eq!(check_expiry(value, far_future), ExpiryCheck::NoPolicy);
    }

    #[rstest]
    #[case::date_only("2024-01-01")]
    #[case::no_offset("2024-01-01T00:00:00")]
    #[case::unix_seconds("1704067200")]
    #[case::garbage("tomorrow")]
    fn malformed_annotation_fails_open(#[case] value: &str) {
        let check = check_expiry(Some(value), at(2999, 1, 1, 0, 0, 0));
        assert!(!check.is_expired());
        assert!(matches!(&check, ExpiryCheck::Malformed(e) if e.value == value));
    }

    #[test]
    fn exactly_at_expiry_is_not_expired() {
        let check = check_expiry(Some("2024-01-01T00:00:00Z"), at(2024, 1, 1, 0, 0, 0));
        assert!(matches!(check, ExpiryCheck::Pending { .. }));
    }

    #[test]
    fn offset_is_honoured() {
        // 09:00+09:00 == 00:00Z
        let value = Some("2024-01-01T09:00:00+09:00");
        assert!(!check_expiry(value, at(2023, 12, 31, 23, 59, 0)).is_expired());

        let check = check_expiry(value, at(2024, 1, 1, 0, 5, 0));
        assert_eq!(check.reason(), Some("expired 5m ago"));
    }

    #[rstest]
    #[case::sub_minute_rounds_down(TimeDelta::seconds(29), "0m")]
    #[case::half_minute_rounds_up(TimeDelta::seconds(30), "1m")]
    #[case::hours_and_minutes(TimeDelta::minutes(125), "2h5m")]
    fn overdue_is_rounded_to_minutes(#[case] overdue: TimeDelta, #[case] expected: &str) {
        assert_eq!(format_minutes(overdue), expected);
    }
}
