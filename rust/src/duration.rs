//! Elapsed-time values made of calendar fields.
//!
//! A [`Duration`] keeps the seven fields it was built from (seconds up to
//! years) but compares, orders and hashes on its normalized length, computed
//! with a fixed approximation table:
//!
//! | unit  | length                 |
//! |-------|------------------------|
//! | year  | 365 days               |
//! | month | 30.4167 days           |
//! | week  | 7 days                 |
//!
//! The month length is held exactly as 304 167 ten-thousandths of a day, so
//! the normalized form is an integer number of milliseconds.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

use crate::error::{Result, ScheduleError};

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const SECONDS_PER_DAY: u64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR * HOURS_PER_DAY;
pub const DAYS_PER_WEEK: u64 = 7;
pub const DAYS_PER_YEAR: u64 = 365;

/// A day expressed in ten-thousandths, the resolution of the month constant.
const DAY_UNITS: u64 = 10_000;
/// 30.4167 days.
const MONTH_DAY_UNITS: u64 = 304_167;

const MILLIS_PER_SECOND: u128 = 1_000;
const MILLIS_PER_DAY: u128 = SECONDS_PER_DAY as u128 * MILLIS_PER_SECOND;
const MILLIS_PER_MONTH: u128 = MILLIS_PER_DAY * MONTH_DAY_UNITS as u128 / DAY_UNITS as u128;

/// Elapsed time expressed as non-negative calendar fields.
///
/// Two durations are equal when their normalized lengths are equal, so
/// `Duration::from_hours(24) == Duration::from_days(1)` even though the fields
/// differ. Addition is field-wise.
#[derive(Clone, Copy, Debug, Default)]
pub struct Duration {
    pub seconds: u64,
    pub minutes: u64,
    pub hours: u64,
    pub days: u64,
    pub weeks: u64,
    pub months: u64,
    pub years: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        seconds: 0,
        minutes: 0,
        hours: 0,
        days: 0,
        weeks: 0,
        months: 0,
        years: 0,
    };

    /// Build a duration from signed fields, rejecting any negative one.
    pub fn new(
        seconds: i64,
        minutes: i64,
        hours: i64,
        days: i64,
        weeks: i64,
        months: i64,
        years: i64,
    ) -> Result<Self> {
        let field = |value: i64, name: &str| -> Result<u64> {
            u64::try_from(value).map_err(|_| {
                ScheduleError::InvalidValue(format!("{} must not be negative, got {}", name, value))
            })
        };
        Ok(Self {
            seconds: field(seconds, "seconds")?,
            minutes: field(minutes, "minutes")?,
            hours: field(hours, "hours")?,
            days: field(days, "days")?,
            weeks: field(weeks, "weeks")?,
            months: field(months, "months")?,
            years: field(years, "years")?,
        })
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self {
            seconds,
            ..Self::ZERO
        }
    }

    pub const fn from_minutes(minutes: u64) -> Self {
        Self {
            minutes,
            ..Self::ZERO
        }
    }

    pub const fn from_hours(hours: u64) -> Self {
        Self { hours, ..Self::ZERO }
    }

    pub const fn from_days(days: u64) -> Self {
        Self { days, ..Self::ZERO }
    }

    pub const fn from_weeks(weeks: u64) -> Self {
        Self { weeks, ..Self::ZERO }
    }

    pub const fn from_months(months: u64) -> Self {
        Self {
            months,
            ..Self::ZERO
        }
    }

    pub const fn from_years(years: u64) -> Self {
        Self { years, ..Self::ZERO }
    }

    /// Re-express a whole number of days with the approximation table.
    ///
    /// Years take 365 days each, months 30.4167 days each; the fraction of a
    /// day left after the months is rounded up so the result is never shorter
    /// than `days`. What remains is split into weeks and days.
    pub fn from_whole_days(days: u64) -> Self {
        let years = days / DAYS_PER_YEAR;
        let rest_units = (days % DAYS_PER_YEAR) * DAY_UNITS;
        let months = rest_units / MONTH_DAY_UNITS;
        let leftover_days = (rest_units % MONTH_DAY_UNITS).div_ceil(DAY_UNITS);
        Self {
            years,
            months,
            weeks: leftover_days / DAYS_PER_WEEK,
            days: leftover_days % DAYS_PER_WEEK,
            ..Self::ZERO
        }
    }

    /// Normalized length in milliseconds.
    pub fn total_millis(&self) -> u128 {
        let exact_seconds = self.seconds as u128
            + self.minutes as u128 * SECONDS_PER_MINUTE as u128
            + self.hours as u128 * (SECONDS_PER_MINUTE * MINUTES_PER_HOUR) as u128;
        let whole_days = self.days as u128
            + self.weeks as u128 * DAYS_PER_WEEK as u128
            + self.years as u128 * DAYS_PER_YEAR as u128;
        exact_seconds * MILLIS_PER_SECOND
            + whole_days * MILLIS_PER_DAY
            + self.months as u128 * MILLIS_PER_MONTH
    }

    /// Normalized length in whole seconds (sub-second month remainders dropped).
    pub fn total_seconds(&self) -> u128 {
        self.total_millis() / MILLIS_PER_SECOND
    }

    pub fn is_zero(&self) -> bool {
        self.total_millis() == 0
    }

    /// Field-wise addition.
    ///
    /// # Returns
    /// * `Err(ScheduleError::InvalidValue)` if a field overflows
    pub fn checked_add(&self, other: &Duration) -> Result<Duration> {
        let sum = (|| {
            Some(Duration {
                seconds: self.seconds.checked_add(other.seconds)?,
                minutes: self.minutes.checked_add(other.minutes)?,
                hours: self.hours.checked_add(other.hours)?,
                days: self.days.checked_add(other.days)?,
                weeks: self.weeks.checked_add(other.weeks)?,
                months: self.months.checked_add(other.months)?,
                years: self.years.checked_add(other.years)?,
            })
        })();
        sum.ok_or_else(|| {
            ScheduleError::InvalidValue(format!("{} plus {} is too long", self, other))
        })
    }

    /// Subtract `other`, failing if it is longer than `self`.
    ///
    /// When every field of `self` covers the matching field of `other` the
    /// result is field-wise. Otherwise the normalized difference is rounded to
    /// the second and expressed in days, hours, minutes and seconds.
    pub fn checked_sub(&self, other: &Duration) -> Result<Duration> {
        if self < other {
            return Err(ScheduleError::InvalidValue(format!(
                "cannot subtract {} from the shorter {}",
                other, self
            )));
        }

        let fieldwise = (|| {
            Some(Duration {
                seconds: self.seconds.checked_sub(other.seconds)?,
                minutes: self.minutes.checked_sub(other.minutes)?,
                hours: self.hours.checked_sub(other.hours)?,
                days: self.days.checked_sub(other.days)?,
                weeks: self.weeks.checked_sub(other.weeks)?,
                months: self.months.checked_sub(other.months)?,
                years: self.years.checked_sub(other.years)?,
            })
        })();
        if let Some(result) = fieldwise {
            return Ok(result);
        }

        let diff_millis = self.total_millis() - other.total_millis();
        let total_seconds = (diff_millis + MILLIS_PER_SECOND / 2) / MILLIS_PER_SECOND;
        let seconds_per_day = SECONDS_PER_DAY as u128;
        let days = u64::try_from(total_seconds / seconds_per_day).map_err(|_| {
            ScheduleError::InvalidValue(format!("difference of {} days overflows", total_seconds))
        })?;
        let within_day = (total_seconds % seconds_per_day) as u64;
        Ok(Duration {
            seconds: within_day % SECONDS_PER_MINUTE,
            minutes: within_day / SECONDS_PER_MINUTE % MINUTES_PER_HOUR,
            hours: within_day / (SECONDS_PER_MINUTE * MINUTES_PER_HOUR),
            days,
            ..Duration::ZERO
        })
    }

    /// Non-zero fields from largest to smallest, with their singular and plural unit names.
    fn parts(&self) -> impl Iterator<Item = (u64, &'static str, &'static str)> {
        [
            (self.years, "an", "ans"),
            (self.months, "mois", "mois"),
            (self.weeks, "semaine", "semaines"),
            (self.days, "jour", "jours"),
            (self.hours, "heure", "heures"),
            (self.minutes, "minute", "minutes"),
            (self.seconds, "seconde", "secondes"),
        ]
        .into_iter()
        .filter(|(value, _, _)| *value > 0)
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.total_millis() == other.total_millis()
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.total_millis().cmp(&other.total_millis())
    }
}

impl Hash for Duration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.total_millis().hash(state);
    }
}

/// Field-wise, saturating at `u64::MAX`; see [`Duration::checked_add`].
impl Add for Duration {
    type Output = Duration;

    fn add(self, other: Duration) -> Duration {
        Duration {
            seconds: self.seconds.saturating_add(other.seconds),
            minutes: self.minutes.saturating_add(other.minutes),
            hours: self.hours.saturating_add(other.hours),
            days: self.days.saturating_add(other.days),
            weeks: self.weeks.saturating_add(other.weeks),
            months: self.months.saturating_add(other.months),
            years: self.years.saturating_add(other.years),
        }
    }
}

impl std::iter::Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Duration {
        iter.fold(Duration::ZERO, Add::add)
    }
}

/// Written in the description language, e.g. `3 ans + 2 semaines`.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (value, singular, plural) in self.parts() {
            if !first {
                write!(f, " + ")?;
            }
            first = false;
            let unit = if value == 1 { singular } else { plural };
            write!(f, "{} {}", value, unit)?;
        }
        if first {
            write!(f, "0 seconde")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_normalized() {
        assert_eq!(Duration::from_hours(24), Duration::from_days(1));
        assert_eq!(Duration::from_weeks(1), Duration::from_days(7));
        assert_eq!(Duration::from_years(1), Duration::from_days(365));
        assert_ne!(Duration::from_months(1), Duration::from_days(30));
    }

    #[test]
    fn test_month_constant() {
        // 30.4167 days, to the millisecond
        assert_eq!(Duration::from_months(1).total_millis(), 2_628_002_880);
        // twelve approximate months overshoot a 365-day year slightly
        assert!(Duration::from_months(12) > Duration::from_years(1));
    }

    #[test]
    fn test_ordering() {
        let short = Duration {
            hours: 23,
            minutes: 59,
            ..Duration::ZERO
        };
        assert!(short < Duration::from_days(1));
        assert!(Duration::from_years(2) > Duration::from_months(23));
        assert_eq!(
            [Duration::from_days(3), Duration::from_hours(5)]
                .into_iter()
                .max(),
            Some(Duration::from_days(3))
        );
    }

    #[test]
    fn test_negative_field_rejected() {
        assert!(Duration::new(0, 0, 0, 3, 0, 0, 1).is_ok());
        let err = Duration::new(0, -1, 0, 0, 0, 0, 0).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidValue(_)));
    }

    #[test]
    fn test_add_is_fieldwise() {
        let a = Duration {
            years: 56,
            weeks: 34,
            days: 23,
            seconds: 32,
            ..Duration::ZERO
        };
        let sum = a + a;
        assert_eq!(sum.years, 112);
        assert_eq!(sum.weeks, 68);
        assert_eq!(sum.days, 46);
        assert_eq!(sum.seconds, 64);
        assert!((a + Duration::ZERO) == a);
    }

    #[test]
    fn test_checked_add_overflow() {
        let big = Duration::from_years(u64::MAX - 1);
        assert_eq!(
            big.checked_add(&Duration::from_years(1)).unwrap().years,
            u64::MAX
        );
        assert!(matches!(
            big.checked_add(&Duration::from_years(2)),
            Err(ScheduleError::InvalidValue(_))
        ));
        // The operator saturates instead of panicking
        assert_eq!((big + big).years, u64::MAX);
    }

    #[test]
    fn test_is_zero() {
        assert!(Duration::ZERO.is_zero());
        assert!(Duration::default().is_zero());
        assert!(!Duration::from_seconds(1).is_zero());
    }

    #[test]
    fn test_checked_sub() {
        let a = Duration {
            years: 3,
            weeks: 2,
            ..Duration::ZERO
        };
        assert_eq!(a.checked_sub(&a).unwrap(), Duration::ZERO);
        assert_eq!(
            a.checked_sub(&Duration::from_weeks(2)).unwrap(),
            Duration::from_years(3)
        );

        // Borrowing across fields falls back to the normalized difference
        let diff = Duration::from_days(2)
            .checked_sub(&Duration::from_hours(3))
            .unwrap();
        assert_eq!(diff.days, 1);
        assert_eq!(diff.hours, 21);

        let err = Duration::from_days(1)
            .checked_sub(&Duration::from_days(2))
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidValue(_)));
    }

    #[test]
    fn test_from_whole_days() {
        let nine = Duration::from_whole_days(9);
        assert_eq!((nine.weeks, nine.days), (1, 2));
        assert_eq!(nine, Duration::from_days(9));

        let two_years = Duration::from_whole_days(730);
        assert_eq!(two_years.years, 2);
        assert!(two_years.months == 0 && two_years.weeks == 0 && two_years.days == 0);

        // 61 days: two months (60.8334 days) plus a day rounded up
        let sixty_one = Duration::from_whole_days(61);
        assert_eq!(sixty_one.months, 2);
        assert_eq!(sixty_one.days, 1);
        assert!(sixty_one >= Duration::from_days(61));
    }

    #[test]
    fn test_from_whole_days_never_shrinks() {
        for days in 0..800 {
            assert!(Duration::from_whole_days(days) >= Duration::from_days(days));
        }
    }

    #[test]
    fn test_display() {
        let d = Duration {
            years: 3,
            weeks: 2,
            ..Duration::ZERO
        };
        assert_eq!(d.to_string(), "3 ans + 2 semaines");
        assert_eq!(Duration::from_seconds(1).to_string(), "1 seconde");
        assert_eq!(Duration::from_months(10).to_string(), "10 mois");
        assert_eq!(Duration::ZERO.to_string(), "0 seconde");
    }
}
