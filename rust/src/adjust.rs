//! Working-time constraints and the adjustments they apply.
//!
//! Relative schedules stretch each task's nominal duration with a daily-hour
//! cap and/or a weekly rest-day count. Absolute schedules derive the same
//! stretch from an hour window and/or a set of rest weekdays, then move the
//! resulting instants into working time.
//!
//! Both stretches are lossy re-approximations through the table in
//! [`crate::duration`]; they never shorten a duration, but applying them twice
//! or undoing them is not exact.

use chrono::Weekday;
use std::str::FromStr;

use crate::date::Date;
use crate::duration::{Duration, DAYS_PER_WEEK, HOURS_PER_DAY, MINUTES_PER_HOUR, SECONDS_PER_DAY, SECONDS_PER_MINUTE};
use crate::error::{Result, ScheduleError};

const MAX_WINDOW_SPAN_HOURS: f64 = 23.9;
const SECONDS_PER_HOUR: u64 = SECONDS_PER_MINUTE * MINUTES_PER_HOUR;

/// Nominal length in whole seconds, rounded up so no time is lost.
fn whole_seconds(duration: &Duration) -> u128 {
    duration.total_millis().div_ceil(1_000)
}

/// Whole days re-expressed through the table, plus an exact sub-day part.
fn recompose(days: u64, seconds_within_day: u64) -> Duration {
    Duration::from_whole_days(days)
        + Duration {
            hours: seconds_within_day / SECONDS_PER_HOUR,
            minutes: seconds_within_day / SECONDS_PER_MINUTE % MINUTES_PER_HOUR,
            seconds: seconds_within_day % SECONDS_PER_MINUTE,
            ..Duration::ZERO
        }
}

/// Maximum productive hours per calendar day, strictly between 0 and 24.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DailyCap(f64);

impl DailyCap {
    pub fn new(hours: f64) -> Result<Self> {
        if hours.is_finite() && hours > 0.0 && hours < HOURS_PER_DAY as f64 {
            Ok(Self(hours))
        } else {
            Err(ScheduleError::InvalidParameter(format!(
                "maximum daily hours must be strictly between 0 and 24, got {}",
                hours
            )))
        }
    }

    pub fn hours(&self) -> f64 {
        self.0
    }

    /// Clock time needed to cover `duration` of work at this many hours a day.
    ///
    /// The whole minutes of work become `round(minutes / hours / 60 * 24 * 60)`
    /// elapsed minutes; leftover seconds are carried over unchanged.
    pub fn stretch(&self, duration: &Duration) -> Duration {
        let total = whole_seconds(duration);
        let minutes = total / SECONDS_PER_MINUTE as u128;
        let seconds = (total % SECONDS_PER_MINUTE as u128) as u64;

        let minutes_per_day = (HOURS_PER_DAY * MINUTES_PER_HOUR) as f64;
        // float to int casts saturate
        let elapsed = (minutes as f64 / self.0 / MINUTES_PER_HOUR as f64 * minutes_per_day).round() as u64;

        let minutes_per_day = HOURS_PER_DAY * MINUTES_PER_HOUR;
        let within_day = elapsed % minutes_per_day * SECONDS_PER_MINUTE + seconds;
        recompose(elapsed / minutes_per_day, within_day)
    }
}

/// Rest days per week, between 1 and 6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestDays(u32);

impl RestDays {
    pub fn new(days: u32) -> Result<Self> {
        if (1..=6).contains(&days) {
            Ok(Self(days))
        } else {
            Err(ScheduleError::InvalidParameter(format!(
                "weekly rest days must be between 1 and 6, got {}",
                days
            )))
        }
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    /// Calendar time needed when only `7 - days` days a week are worked.
    ///
    /// The whole days become full active weeks plus leftover days; hours,
    /// minutes and seconds are carried over unchanged.
    pub fn stretch(&self, duration: &Duration) -> Duration {
        let total = whole_seconds(duration);
        let days = u64::try_from(total / SECONDS_PER_DAY as u128).unwrap_or(u64::MAX);
        let within_day = (total % SECONDS_PER_DAY as u128) as u64;

        let active = DAYS_PER_WEEK - self.0 as u64;
        let elapsed = (days / active)
            .saturating_mul(DAYS_PER_WEEK)
            .saturating_add(days % active);
        recompose(elapsed, within_day)
    }
}

/// Which capacity constraints a relative resolution applies.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum CapacityConstraints {
    #[default]
    None,
    Daily(DailyCap),
    Rest(RestDays),
    Both(DailyCap, RestDays),
}

impl CapacityConstraints {
    /// Validate optional raw parameters and pick the matching variant.
    pub fn from_options(max_daily_hours: Option<f64>, rest_days_per_week: Option<u32>) -> Result<Self> {
        let daily = max_daily_hours.map(DailyCap::new).transpose()?;
        let rest = rest_days_per_week.map(RestDays::new).transpose()?;
        Ok(match (daily, rest) {
            (None, None) => Self::None,
            (Some(daily), None) => Self::Daily(daily),
            (None, Some(rest)) => Self::Rest(rest),
            (Some(daily), Some(rest)) => Self::Both(daily, rest),
        })
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Effective span of a task; the daily cap applies before the rest days.
    pub fn stretch(&self, duration: &Duration) -> Duration {
        match self {
            Self::None => *duration,
            Self::Daily(daily) => daily.stretch(duration),
            Self::Rest(rest) => rest.stretch(duration),
            Self::Both(daily, rest) => rest.stretch(&daily.stretch(duration)),
        }
    }
}

/// Daily working-hour window, bounds given as fractional hours in `[0, 24)`.
///
/// A window whose upper bound is below its lower bound wraps past midnight:
/// `22-6` means from 22:00 to 06:00 the next morning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourWindow {
    min_hours: f64,
    max_hours: f64,
    cap: DailyCap,
}

impl HourWindow {
    pub fn new(min_hours: f64, max_hours: f64) -> Result<Self> {
        for bound in [min_hours, max_hours] {
            if !(bound.is_finite() && (0.0..HOURS_PER_DAY as f64).contains(&bound)) {
                return Err(ScheduleError::InvalidParameter(format!(
                    "hour window bounds must lie in [0, 24), got {}",
                    bound
                )));
            }
        }
        if min_hours == max_hours {
            return Err(ScheduleError::InvalidParameter(format!(
                "hour window {}-{} is empty",
                min_hours, max_hours
            )));
        }

        let span = if max_hours > min_hours {
            max_hours - min_hours
        } else {
            max_hours + HOURS_PER_DAY as f64 - min_hours
        };
        if span > MAX_WINDOW_SPAN_HOURS {
            return Err(ScheduleError::InvalidParameter(format!(
                "hour window {}-{} spans {} hours, more than {}",
                min_hours, max_hours, span, MAX_WINDOW_SPAN_HOURS
            )));
        }

        Ok(Self {
            min_hours,
            max_hours,
            cap: DailyCap::new(span)?,
        })
    }

    /// Working hours per day covered by the window.
    pub fn span_hours(&self) -> f64 {
        self.cap.hours()
    }

    pub fn daily_cap(&self) -> DailyCap {
        self.cap
    }

    fn min_seconds(&self) -> u32 {
        Self::seconds_of(self.min_hours)
    }

    fn max_seconds(&self) -> u32 {
        Self::seconds_of(self.max_hours)
    }

    /// Nearest second since midnight, kept within the day.
    fn seconds_of(hours: f64) -> u32 {
        let last_second = (SECONDS_PER_DAY - 1) as u32;
        ((hours * SECONDS_PER_HOUR as f64).round() as u32).min(last_second)
    }

    fn wraps(&self) -> bool {
        self.max_hours < self.min_hours
    }

    /// Whether the time of day of `date` falls inside the window.
    pub fn contains(&self, date: &Date) -> bool {
        let second = date.seconds_of_day();
        if self.wraps() {
            second >= self.min_seconds() || second < self.max_seconds()
        } else {
            second >= self.min_seconds() && second < self.max_seconds()
        }
    }

    /// Move an instant outside the window to the next window opening.
    ///
    /// Before the opening it moves to the opening of the same day; at or after
    /// the closing it moves to the opening of the next day. Never skips more
    /// than one day.
    pub fn clamp(&self, date: &Date) -> Result<Date> {
        if self.contains(date) {
            return Ok(*date);
        }

        let opening = self.min_seconds();
        let day = if !self.wraps() && date.seconds_of_day() >= self.max_seconds() {
            date.next_day()?
        } else {
            *date
        };
        day.with_time(
            opening / SECONDS_PER_HOUR as u32,
            opening / SECONDS_PER_MINUTE as u32 % MINUTES_PER_HOUR as u32,
            opening % SECONDS_PER_MINUTE as u32,
        )
    }
}

/// Parses `H-H` such as `9-18` or `12.5-18.5`.
impl FromStr for HourWindow {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || {
            ScheduleError::InvalidParameter(format!(
                "hour window {:?} must look like 'H-H', e.g. '9-18'",
                s
            ))
        };
        let (min, max) = s.split_once('-').ok_or_else(malformed)?;
        let min: f64 = min.trim().parse().map_err(|_| malformed())?;
        let max: f64 = max.trim().parse().map_err(|_| malformed())?;
        Self::new(min, max)
    }
}

/// Parse a weekday name, in French or English.
pub fn parse_weekday(name: &str) -> Result<Weekday> {
    let weekday = match name.trim().to_lowercase().as_str() {
        "lundi" => Weekday::Mon,
        "mardi" => Weekday::Tue,
        "mercredi" => Weekday::Wed,
        "jeudi" => Weekday::Thu,
        "vendredi" => Weekday::Fri,
        "samedi" => Weekday::Sat,
        "dimanche" => Weekday::Sun,
        other => other.parse::<Weekday>().map_err(|_| {
            ScheduleError::InvalidParameter(format!("{:?} is not a weekday", name.trim()))
        })?,
    };
    Ok(weekday)
}

/// Named weekdays on which no work happens. At least one, at most six, no repeats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestWeekdays {
    days: Vec<Weekday>,
    count: RestDays,
}

impl RestWeekdays {
    pub fn new(days: Vec<Weekday>) -> Result<Self> {
        if days.len() >= DAYS_PER_WEEK as usize {
            return Err(ScheduleError::InvalidParameter(
                "rest weekdays cannot cover the whole week".to_string(),
            ));
        }
        for (i, day) in days.iter().enumerate() {
            if days[..i].contains(day) {
                return Err(ScheduleError::InvalidParameter(format!(
                    "rest weekday {} is listed more than once",
                    day
                )));
            }
        }
        let count = RestDays::new(days.len() as u32).map_err(|_| {
            ScheduleError::InvalidParameter("at least one rest weekday is required".to_string())
        })?;
        Ok(Self { days, count })
    }

    pub fn days(&self) -> &[Weekday] {
        &self.days
    }

    /// The equivalent weekly rest-day count.
    pub fn rest_days(&self) -> RestDays {
        self.count
    }

    pub fn is_rest(&self, weekday: Weekday) -> bool {
        self.days.contains(&weekday)
    }

    /// Advance day by day until the instant lands on a working weekday.
    pub fn skip(&self, date: &Date) -> Result<Date> {
        let mut current = *date;
        while self.is_rest(current.weekday()) {
            current = current.next_day()?;
        }
        Ok(current)
    }
}

/// Parses weekday names separated by spaces or commas, e.g. `Samedi Dimanche`.
impl FromStr for RestWeekdays {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        let days = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|word| !word.is_empty())
            .map(parse_weekday)
            .collect::<Result<Vec<_>>>()?;
        Self::new(days)
    }
}

/// Which calendar constraints an absolute resolution applies.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CalendarConstraints {
    #[default]
    None,
    Window(HourWindow),
    Rest(RestWeekdays),
    Both(HourWindow, RestWeekdays),
}

impl CalendarConstraints {
    pub fn from_options(window: Option<HourWindow>, rest: Option<RestWeekdays>) -> Self {
        match (window, rest) {
            (None, None) => Self::None,
            (Some(window), None) => Self::Window(window),
            (None, Some(rest)) => Self::Rest(rest),
            (Some(window), Some(rest)) => Self::Both(window, rest),
        }
    }

    /// Validate textual parameters (`"9-18"`, `"Samedi Dimanche"`) and pick the variant.
    pub fn parse(window: Option<&str>, rest: Option<&str>) -> Result<Self> {
        let window = window.map(str::parse::<HourWindow>).transpose()?;
        let rest = rest.map(str::parse::<RestWeekdays>).transpose()?;
        Ok(Self::from_options(window, rest))
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// The capacity stretch implied by these constraints.
    pub fn capacity(&self) -> CapacityConstraints {
        match self {
            Self::None => CapacityConstraints::None,
            Self::Window(window) => CapacityConstraints::Daily(window.daily_cap()),
            Self::Rest(rest) => CapacityConstraints::Rest(rest.rest_days()),
            Self::Both(window, rest) => {
                CapacityConstraints::Both(window.daily_cap(), rest.rest_days())
            }
        }
    }

    /// Move an instant into working time: window clamp first, then rest-day skip.
    pub fn adjust(&self, date: &Date) -> Result<Date> {
        match self {
            Self::None => Ok(*date),
            Self::Window(window) => window.clamp(date),
            Self::Rest(rest) => rest.skip(date),
            Self::Both(window, rest) => rest.skip(&window.clamp(date)?),
        }
    }
}
