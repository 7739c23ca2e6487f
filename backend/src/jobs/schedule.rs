//! When a periodic task fires.

use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};

/// Rejected schedule parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule interval must be greater than zero")]
    ZeroInterval,
    #[error("invalid time of day {hour:02}:{minute:02}")]
    InvalidTimeOfDay { hour: u32, minute: u32 },
}

/// Firing pattern of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fire immediately, then after every interval. Ticks missed while a
    /// run is in progress are skipped.
    Every(Duration),
    /// Fire once a day at a fixed UTC wall-clock time.
    DailyAt(NaiveTime),
}

impl Schedule {
    /// Fixed interval schedule.
    pub fn every(interval: Duration) -> Result<Self, ScheduleError> {
        if interval.is_zero() {
            return Err(ScheduleError::ZeroInterval);
        }
        Ok(Self::Every(interval))
    }

    /// Daily schedule at `hour:minute` UTC.
    ///
    /// # Examples
    /// ```
    /// use segments::jobs::Schedule;
    ///
    /// assert!(Schedule::daily_at(3, 30).is_ok());
    /// assert!(Schedule::daily_at(24, 0).is_err());
    /// ```
    pub fn daily_at(hour: u32, minute: u32) -> Result<Self, ScheduleError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self::DailyAt)
            .ok_or(ScheduleError::InvalidTimeOfDay { hour, minute })
    }

    /// Delay from `now` until the next firing.
    ///
    /// Interval schedules always wait one full interval. Daily schedules
    /// wait for the next occurrence strictly after `now`, rolling over to
    /// tomorrow once today's time has been reached.
    #[must_use]
    pub fn next_delay(&self, now: DateTime<Utc>) -> Duration {
        match *self {
            Self::Every(interval) => interval,
            Self::DailyAt(time) => {
                let today = now.date_naive().and_time(time).and_utc();
                let next = if today > now {
                    today
                } else {
                    today + TimeDelta::days(1)
                };
                (next - now).to_std().unwrap_or(Duration::ZERO)
            }
        }
    }
}
