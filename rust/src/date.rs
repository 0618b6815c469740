//! Calendar instants for absolute schedules.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};
use std::fmt;
use std::str::FromStr;

use crate::duration::{Duration, MINUTES_PER_HOUR, SECONDS_PER_DAY, SECONDS_PER_MINUTE};
use crate::error::{Result, ScheduleError};

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;
const MONTHS_PER_YEAR: u64 = 12;

/// A calendar instant to the second, validated against real calendar limits.
///
/// Ordering follows the instant in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDateTime);

impl Date {
    /// Build a date from its fields.
    ///
    /// # Returns
    /// * `Err(ScheduleError::InvalidDate)` if a field is out of range, including
    ///   a day that does not exist in the given month (leap years included)
    pub fn new(day: u32, month: u32, year: i32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ScheduleError::InvalidDate(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if hour > 23 {
            return Err(ScheduleError::InvalidDate(format!(
                "hour must be between 0 and 23, got {}",
                hour
            )));
        }
        if minute > 59 || second > 59 {
            return Err(ScheduleError::InvalidDate(format!(
                "minutes and seconds must be between 0 and 59, got {}:{}",
                minute, second
            )));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ScheduleError::InvalidDate(format!(
                "year must be between {} and {}, got {}",
                MIN_YEAR, MAX_YEAR, year
            )));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ScheduleError::InvalidDate(format!(
                "day {} does not exist in {:02}/{}",
                day, month, year
            ))
        })?;
        let datetime = date.and_hms_opt(hour, minute, second).ok_or_else(|| {
            ScheduleError::InvalidDate(format!("invalid time {}:{}:{}", hour, minute, second))
        })?;
        Ok(Self(datetime))
    }

    /// Midnight at the start of the given day.
    pub fn midnight(day: u32, month: u32, year: i32) -> Result<Self> {
        Self::new(day, month, year, 0, 0, 0)
    }

    fn bounded(datetime: NaiveDateTime) -> Result<Self> {
        if (MIN_YEAR..=MAX_YEAR).contains(&datetime.year()) {
            Ok(Self(datetime))
        } else {
            Err(ScheduleError::InvalidDate(format!(
                "{} falls outside years {}-{}",
                datetime, MIN_YEAR, MAX_YEAR
            )))
        }
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Seconds since the Unix epoch, reading the instant as UTC.
    pub fn timestamp(&self) -> i64 {
        self.0.and_utc().timestamp()
    }

    /// Seconds elapsed since midnight.
    pub fn seconds_of_day(&self) -> u32 {
        self.0.num_seconds_from_midnight()
    }

    /// Same day at the given time of day.
    pub fn with_time(&self, hour: u32, minute: u32, second: u32) -> Result<Self> {
        Self::new(self.day(), self.month(), self.year(), hour, minute, second)
    }

    /// Same time of day, one calendar day later.
    pub fn next_day(&self) -> Result<Self> {
        self.checked_add(&Duration::from_days(1))
    }

    /// Calendar-correct addition.
    ///
    /// Years and months are added as calendar months (the day is clamped to the
    /// end of a shorter month), then weeks, days, hours, minutes and seconds as
    /// exact elapsed time.
    pub fn checked_add(&self, span: &Duration) -> Result<Self> {
        let (months, delta) = split_span(span)?;
        let shifted = self
            .0
            .checked_add_months(months)
            .and_then(|dt| dt.checked_add_signed(delta))
            .ok_or_else(|| out_of_range(self, span))?;
        Self::bounded(shifted)
    }

    /// Calendar-correct subtraction, mirroring [`Date::checked_add`].
    pub fn checked_sub(&self, span: &Duration) -> Result<Self> {
        let (months, delta) = split_span(span)?;
        let shifted = self
            .0
            .checked_sub_months(months)
            .and_then(|dt| dt.checked_sub_signed(delta))
            .ok_or_else(|| out_of_range(self, span))?;
        Self::bounded(shifted)
    }
}

fn out_of_range(date: &Date, span: &Duration) -> ScheduleError {
    ScheduleError::InvalidDate(format!("{} shifted by {} is out of range", date, span))
}

/// Split a duration into its calendar-month part and its exact part.
fn split_span(span: &Duration) -> Result<(Months, TimeDelta)> {
    let too_long = || ScheduleError::InvalidDate(format!("duration {} is too long", span));

    let months = span
        .years
        .checked_mul(MONTHS_PER_YEAR)
        .and_then(|m| m.checked_add(span.months))
        .and_then(|m| u32::try_from(m).ok())
        .ok_or_else(too_long)?;

    let exact_seconds = (span.weeks as u128 * 7 + span.days as u128) * SECONDS_PER_DAY as u128
        + span.hours as u128 * (MINUTES_PER_HOUR * SECONDS_PER_MINUTE) as u128
        + span.minutes as u128 * SECONDS_PER_MINUTE as u128
        + span.seconds as u128;
    let delta = i64::try_from(exact_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(too_long)?;

    Ok((Months::new(months), delta))
}

/// `DD/MM/YYYY/HH:MM:SS`, which [`Date::from_str`] reads back.
impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04}/{:02}:{:02}:{:02}",
            self.day(),
            self.month(),
            self.year(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

/// Parses `DD/MM/YYYY[/HH[:MM[:SS]]]`; missing time parts default to zero.
impl FromStr for Date {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let fields: Vec<&str> = s.trim().split('/').collect();
        let (day, month, year, time) = match fields.as_slice() {
            [d, m, y] => (*d, *m, *y, None),
            [d, m, y, t] => (*d, *m, *y, Some(*t)),
            _ => {
                return Err(ScheduleError::MalformedInput(format!(
                    "date {:?} must look like DD/MM/YYYY[/HH:MM[:SS]]",
                    s
                )))
            }
        };

        let (hour, minute, second) = match time {
            None => (0, 0, 0),
            Some(t) => {
                let parts: Vec<&str> = t.split(':').collect();
                match parts.as_slice() {
                    [h] => (number(h)?, 0, 0),
                    [h, m] => (number(h)?, number(m)?, 0),
                    [h, m, sec] => (number(h)?, number(m)?, number(sec)?),
                    _ => {
                        return Err(ScheduleError::MalformedInput(format!(
                            "time of day {:?} must look like HH:MM[:SS]",
                            t
                        )))
                    }
                }
            }
        };

        let year = i32::try_from(number(year)?)
            .map_err(|_| ScheduleError::InvalidDate(format!("year {} is out of range", year)))?;
        Date::new(number(day)?, number(month)?, year, hour, minute, second)
    }
}

/// Read one numeric date field.
fn number(field: &str) -> Result<u32> {
    let value: i64 = field.trim().parse().map_err(|_| {
        ScheduleError::MalformedInput(format!("value {:?} is not numeric", field.trim()))
    })?;
    u32::try_from(value)
        .map_err(|_| ScheduleError::InvalidDate(format!("field {} is out of range", value)))
}
