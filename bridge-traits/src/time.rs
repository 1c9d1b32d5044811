//! Injectable time source.
//!
//! Release cutoffs are computed from "today"; tests pin it with a fixed
//! clock instead of racing the wall clock.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current instant.
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn cutoff(clock: &dyn Clock, days: u64) -> chrono::NaiveDate {
///     clock.today() - chrono::Days::new(days)
/// }
/// ```
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of [`now`](Clock::now) in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pinned(&'static str);

    impl Clock for Pinned {
        fn now(&self) -> DateTime<Utc> {
            DateTime::parse_from_rfc3339(self.0)
                .unwrap()
                .with_timezone(&Utc)
        }
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let first = SystemClock.now();
        let second = SystemClock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_today_is_utc_date() {
        assert_eq!(
            Pinned("2024-03-10T23:59:00Z").today(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        // 01:30 in UTC+2 is still the previous UTC day.
        assert_eq!(
            Pinned("2024-03-11T01:30:00+02:00").today(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
    }
}
