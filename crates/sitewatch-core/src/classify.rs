// ── Certificate classification ──
//
// THE single place where remaining lifetime maps to an urgency tier.
// Summary counts, badge colors, and notification priorities all go
// through these functions; no caller re-implements the thresholds.

use chrono::{DateTime, Utc};

use crate::model::{CertificateStatus, NotificationPriority};

/// Days considered "critical" (expires within a week, or today).
const CRITICAL_WINDOW_DAYS: i64 = 7;
/// Days considered "expiring" (worth watching, not yet urgent).
const EXPIRING_WINDOW_DAYS: i64 = 30;

/// Map remaining lifetime to an urgency tier.
///
/// Total and deterministic. Tier boundaries are inclusive at the lower
/// bound and exclusive at the upper bound:
///
/// - `None`        -> `Error` (no data obtained)
/// - `d < 0`       -> `Expired`
/// - `0 <= d <= 7` -> `Critical`
/// - `7 < d <= 30` -> `Expiring`
/// - `d > 30`      -> `Valid`
pub fn classify(days_remaining: Option<i64>) -> CertificateStatus {
    match days_remaining {
        None => CertificateStatus::Error,
        Some(d) if d < 0 => CertificateStatus::Expired,
        Some(d) if d <= CRITICAL_WINDOW_DAYS => CertificateStatus::Critical,
        Some(d) if d <= EXPIRING_WINDOW_DAYS => CertificateStatus::Expiring,
        Some(_) => CertificateStatus::Valid,
    }
}

/// Notification priority for a tier, or `None` when the tier is not
/// alert-worthy (a valid certificate emits nothing).
pub fn notification_priority(status: CertificateStatus) -> Option<NotificationPriority> {
    match status {
        CertificateStatus::Valid => None,
        CertificateStatus::Expiring => Some(NotificationPriority::High),
        CertificateStatus::Critical
        | CertificateStatus::Expired
        | CertificateStatus::Invalid
        | CertificateStatus::Error => Some(NotificationPriority::Critical),
    }
}

/// Whole days until `expires_at`, as a ceiling: a certificate expiring in
/// 2 days 23 hours still reads "3 days". Negative once a full day past
/// expiry; `None` when expiry is unknown.
pub fn days_until(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    const DAY_SECS: i64 = 86_400;
    expires_at.map(|e| {
        let secs = (e - now).num_seconds();
        // ceiling division in whole days
        secs.div_euclid(DAY_SECS) + i64::from(secs.rem_euclid(DAY_SECS) != 0)
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn classify_is_total_over_the_tiers() {
        assert_eq!(classify(None), CertificateStatus::Error);
        assert_eq!(classify(Some(-365)), CertificateStatus::Expired);
        assert_eq!(classify(Some(3)), CertificateStatus::Critical);
        assert_eq!(classify(Some(15)), CertificateStatus::Expiring);
        assert_eq!(classify(Some(90)), CertificateStatus::Valid);
    }

    #[test]
    fn tier_boundaries_partition_exactly() {
        // Boundary at 0: -1 expired, 0 critical.
        assert_eq!(classify(Some(-1)), CertificateStatus::Expired);
        assert_eq!(classify(Some(0)), CertificateStatus::Critical);

        // Boundary at 7: 7 critical, 8 expiring.
        assert_eq!(classify(Some(7)), CertificateStatus::Critical);
        assert_eq!(classify(Some(8)), CertificateStatus::Expiring);

        // Boundary at 30: 30 expiring, 31 valid.
        assert_eq!(classify(Some(30)), CertificateStatus::Expiring);
        assert_eq!(classify(Some(31)), CertificateStatus::Valid);
    }

    #[test]
    fn priority_follows_status() {
        assert_eq!(notification_priority(CertificateStatus::Valid), None);
        assert_eq!(
            notification_priority(CertificateStatus::Expiring),
            Some(NotificationPriority::High)
        );
        for status in [
            CertificateStatus::Critical,
            CertificateStatus::Expired,
            CertificateStatus::Invalid,
            CertificateStatus::Error,
        ] {
            assert_eq!(
                notification_priority(status),
                Some(NotificationPriority::Critical)
            );
        }
    }

    #[test]
    fn days_until_rounds_up() {
        let now = Utc::now();

        assert_eq!(days_until(None, now), None);
        assert_eq!(days_until(Some(now + Duration::days(3)), now), Some(3));
        // 2 days 23 hours out still reads 3 days
        assert_eq!(
            days_until(Some(now + Duration::days(3) - Duration::hours(1)), now),
            Some(3)
        );
        // an hour past expiry is day 0, not yet negative
        assert_eq!(days_until(Some(now - Duration::hours(1)), now), Some(0));
        // a full day past expiry goes negative
        assert_eq!(days_until(Some(now - Duration::days(1)), now), Some(-1));
    }

    #[test]
    fn three_days_out_is_critical() {
        let now = Utc::now();
        let days = days_until(Some(now + Duration::days(3)), now);
        assert_eq!(days, Some(3));
        assert_eq!(classify(days), CertificateStatus::Critical);
    }
}
