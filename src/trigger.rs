//! Schedule triggers.
//!
//! A trigger turns a schedule definition into concrete fire times. The
//! store and the scheduler both consume triggers through the single-method
//! [`Trigger`] trait, so any schedule shape (fixed interval, cron
//! expression, one-shot date) plugs in polymorphically.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;

/// A schedule definition.
///
/// Given the previous fire time (if any) and the current time, compute
/// when the job fires next. `None` means the schedule is exhausted and
/// the job is finished.
pub trait Trigger: fmt::Debug + Send + Sync {
    /// Compute the next fire time.
    ///
    /// `previous` is `None` on the very first consultation, when a job is
    /// added without a precomputed fire time.
    fn next_fire_time(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>>;
}

/// Fires at a fixed interval.
///
/// The first fire is the configured start time (if set) or `now +
/// interval`. Subsequent fires step from the previous fire time, skipping
/// ahead past `now` so a stalled scheduler does not replay missed
/// periods.
#[derive(Debug, Clone)]
pub struct IntervalTrigger {
    interval: Duration,
    start_at: Option<DateTime<Utc>>,
}

impl IntervalTrigger {
    /// Create a trigger with the given period.
    ///
    /// # Panics
    ///
    /// Panics if the interval is not positive.
    pub fn new(interval: Duration) -> Self {
        assert!(interval > Duration::zero(), "interval must be positive");
        Self {
            interval,
            start_at: None,
        }
    }

    /// Trigger firing every `secs` seconds.
    pub fn every_secs(secs: i64) -> Self {
        Self::new(Duration::seconds(secs))
    }

    /// Trigger firing every `minutes` minutes.
    pub fn every_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    /// Trigger firing every `hours` hours.
    pub fn every_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    /// Anchor the first fire at a specific time instead of `now + interval`.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start_at = Some(start);
        self
    }
}

impl Trigger for IntervalTrigger {
    fn next_fire_time(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let mut next = match previous {
            Some(prev) => prev + self.interval,
            None => self.start_at.unwrap_or(now + self.interval),
        };
        // Skip periods that elapsed while nobody was looking.
        while next <= now {
            next = next + self.interval;
        }
        Some(next)
    }
}

/// Fires on a cron schedule.
///
/// The expression follows the six-field format of the `cron` crate:
/// `second minute hour day_of_month month day_of_week`.
///
/// Examples:
/// - `"0 0 * * * *"` - Every hour at minute 0
/// - `"0 */5 * * * *"` - Every 5 minutes
/// - `"0 0 9 * * MON-FRI"` - 9 AM on weekdays
#[derive(Debug, Clone)]
pub struct CronTrigger {
    schedule: Schedule,
    expr: String,
}

impl CronTrigger {
    /// Parse a cron expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the cron expression is invalid.
    pub fn new(expr: &str) -> Result<Self, cron::error::Error> {
        let schedule: Schedule = expr.parse()?;
        Ok(Self {
            schedule,
            expr: expr.to_string(),
        })
    }

    /// Get the source expression.
    pub fn expr(&self) -> &str {
        &self.expr
    }
}

impl Trigger for CronTrigger {
    fn next_fire_time(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        // Cron does not catch up: the next occurrence is always in the
        // future, even after a stall.
        let after = previous.map_or(now, |prev| prev.max(now));
        self.schedule.after(&after).next()
    }
}

/// Fires exactly once, at a fixed instant.
#[derive(Debug, Clone)]
pub struct DateTrigger {
    at: DateTime<Utc>,
}

impl DateTrigger {
    /// Create a one-shot trigger for the given instant.
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }

    /// Get the fire instant.
    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

impl Trigger for DateTrigger {
    fn next_fire_time(
        &self,
        previous: Option<DateTime<Utc>>,
        _now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match previous {
            Some(_) => None,
            None => Some(self.at),
        }
    }
}

/// Common cron schedule presets.
pub mod presets {
    use super::CronTrigger;

    /// Every minute, on the minute.
    pub const EVERY_MINUTE: &str = "0 * * * * *";

    /// Top of every hour.
    pub const HOURLY: &str = "0 0 * * * *";

    /// Every day at midnight UTC.
    pub const DAILY_MIDNIGHT: &str = "0 0 0 * * *";

    /// First day of each month at midnight UTC.
    pub const MONTHLY_FIRST: &str = "0 0 0 1 * *";

    /// Cron trigger firing every N minutes.
    pub fn every_minutes(minutes: u32) -> Result<CronTrigger, cron::error::Error> {
        CronTrigger::new(&format!("0 */{} * * * *", minutes))
    }

    /// Cron trigger firing daily at the given UTC hour and minute.
    pub fn daily_at(hour: u32, minute: u32) -> Result<CronTrigger, cron::error::Error> {
        CronTrigger::new(&format!("0 {} {} * * *", minute, hour))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn interval_first_fire() {
        let trigger = IntervalTrigger::every_secs(30);
        assert_eq!(trigger.next_fire_time(None, t(0)), Some(t(30)));
    }

    #[test]
    fn interval_steps_from_previous() {
        let trigger = IntervalTrigger::every_secs(10);
        assert_eq!(trigger.next_fire_time(Some(t(40)), t(41)), Some(t(50)));
    }

    #[test]
    fn interval_skips_missed_periods() {
        let trigger = IntervalTrigger::every_secs(10);
        // Last fired 25s ago: 10s and 20s steps are already in the past.
        assert_eq!(trigger.next_fire_time(Some(t(-25)), t(0)), Some(t(5)));
    }

    #[test]
    fn interval_start_at() {
        let trigger = IntervalTrigger::every_secs(60).starting_at(t(15));
        assert_eq!(trigger.next_fire_time(None, t(0)), Some(t(15)));
    }

    #[test]
    #[should_panic(expected = "interval must be positive")]
    fn interval_rejects_zero() {
        IntervalTrigger::new(Duration::zero());
    }

    #[test]
    fn cron_next_occurrence() {
        let trigger = CronTrigger::new("0 0 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        let next = trigger.next_fire_time(None, now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap());
    }

    #[test]
    fn cron_does_not_catch_up() {
        let trigger = CronTrigger::new("0 0 * * * *").unwrap();
        let previous = Utc.with_ymd_and_hms(2026, 1, 15, 6, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 30, 0).unwrap();
        // Hours 7..10 were missed; the next fire is still in the future.
        let next = trigger.next_fire_time(Some(previous), now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 15, 11, 0, 0).unwrap());
    }

    #[test]
    fn cron_invalid_expr() {
        assert!(CronTrigger::new("not a cron expression").is_err());
    }

    #[test]
    fn date_fires_once() {
        let trigger = DateTrigger::new(t(100));
        assert_eq!(trigger.next_fire_time(None, t(0)), Some(t(100)));
        assert_eq!(trigger.next_fire_time(Some(t(100)), t(101)), None);
    }

    #[test]
    fn presets_parse() {
        assert!(CronTrigger::new(presets::EVERY_MINUTE).is_ok());
        assert!(CronTrigger::new(presets::HOURLY).is_ok());
        assert!(CronTrigger::new(presets::DAILY_MIDNIGHT).is_ok());
        assert!(CronTrigger::new(presets::MONTHLY_FIRST).is_ok());
        assert!(presets::every_minutes(5).is_ok());
        assert!(presets::daily_at(9, 30).is_ok());
    }
}
